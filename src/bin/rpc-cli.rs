use clap::{Parser, Subcommand};
use serde_json::Value;

use typed_rpc::client::{ClientError, ClientProxy, ProxyNode};
use typed_rpc::routing::{Method, PathPattern, Segment};

#[derive(Parser)]
#[command(name = "rpc-cli")]
#[command(about = "Inspect and call a typed-rpc server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the server's routes with their input and output types
    Routes,
    /// Call a route, e.g. `call GET /item/1` or `call POST /hello2 --input '{...}'`
    Call {
        method: String,
        path: String,
        /// JSON input (query for GET-like methods, body otherwise)
        #[arg(short, long)]
        input: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Routes => {
            let proxy = ClientProxy::discover(&cli.url).await?;
            for shape in &proxy.manifest().routes {
                println!("{}", shape.signature());
            }
        }
        Commands::Call {
            method,
            path,
            input,
        } => {
            let method: Method = method.parse()?;
            let input: Value = match input {
                Some(raw) => serde_json::from_str(&raw)?,
                None => Value::Null,
            };

            let proxy = ClientProxy::discover(&cli.url).await?;
            let node = resolve(&proxy, method, &path)?;
            match node.call(method, &input).await {
                Ok(value) => print_value(&value)?,
                Err(ClientError::Status {
                    status, payload, ..
                }) => {
                    eprintln!("Error: server returned status {}", status);
                    print_value(&payload)?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}

/// Walk the proxy along the first route whose pattern matches `path`.
fn resolve(proxy: &ClientProxy, method: Method, path: &str) -> Result<ProxyNode, ClientError> {
    for (route_method, raw) in proxy.paths() {
        if route_method != method {
            continue;
        }
        let pattern = PathPattern::parse(&raw)?;
        let Some(params) = pattern.matches(path) else {
            continue;
        };

        let mut node = proxy.root();
        for segment in pattern.segments() {
            node = match segment {
                Segment::Literal(literal) => node.at(literal)?,
                Segment::Param(name) => node.param(name, params.get(name).unwrap_or_default())?,
            };
        }
        return Ok(node);
    }
    Err(ClientError::UnknownRoute(format!("{} {}", method, path)))
}

fn print_value(value: &Value) -> Result<(), serde_json::Error> {
    match value {
        Value::String(text) => println!("{}", text),
        other => println!("{}", serde_json::to_string_pretty(other)?),
    }
    Ok(())
}
