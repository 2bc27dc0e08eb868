use std::{env, fs, io::Cursor, sync::Arc, thread::spawn};

use anyhow::Result;
use form_body::{BodyDecoder, Config};
use tempfile::tempdir;
use tiny_http::{Header, Request, Response, Server};

fn header<'a>(request: &'a Request, name: &'static str) -> Option<&'a str> {
    request
        .headers()
        .iter()
        .find(|h: &&Header| h.field.equiv(name))
        .map(|h| h.value.as_str())
}

fn hello(config: &Config, request: &mut Request) -> Result<Response<Cursor<Vec<u8>>>> {
    let content_type = header(request, "Content-Type").map(ToString::to_string);
    let content_length = header(request, "Content-Length").and_then(|v| v.parse::<u64>().ok());

    let mut decoder = BodyDecoder::new(config, content_type.as_deref(), content_length);

    let result = match decoder.decode(request.as_reader()) {
        Ok(result) => result,
        Err(e) => {
            for path in decoder.spooled() {
                let _ = fs::remove_file(path);
            }
            tracing::warn!("{}", e);
            return Ok(Response::from_string(e.to_string()).with_status_code(400));
        }
    };

    for (name, file) in result.files.iter() {
        tracing::info!("file {} {:?}", name, file);
    }

    let json = serde_json::to_vec_pretty(&result)?;

    // uploads are not kept by this demo
    for path in decoder.spooled() {
        fs::remove_file(path)?;
    }

    Ok(Response::from_data(json).with_header(
        "Content-Type: application/json"
            .parse::<Header>()
            .map_err(|()| anyhow::anyhow!("invalid header"))?,
    ))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        // From env var: `RUST_LOG`
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    let mut arg = env::args()
        .find(|a| a.starts_with("--size="))
        .unwrap_or_else(|| "--size=8".to_string());

    let size = arg.split_off(7).parse::<usize>().unwrap_or(8).max(1) * 1024;
    let dir = tempdir()?;

    let config = Arc::new(
        Config::default()
            .uploaded_files_dir(dir.path())
            .read_block_size(size)
            .max_uploaded_files(2)
            .max_file_size(1024)
            .max_content_length(512),
    );

    let server = Server::http("0.0.0.0:3000").map_err(|e| anyhow::anyhow!(e))?;
    println!("Now listening on port 3000");

    for mut request in server.incoming_requests() {
        let config = Arc::clone(&config);
        spawn(move || {
            let response = match hello(&config, &mut request) {
                Ok(response) => response,
                Err(e) => Response::from_string(e.to_string()).with_status_code(500),
            };
            let _ = request.respond(response);
        });
    }

    Ok(())
}
