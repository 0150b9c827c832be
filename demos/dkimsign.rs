use dmail::{header::HeaderFields, signer::BodyLength, SignRequest, Signer};
use std::{env, process};
use tokio::{
    fs,
    io::{self, AsyncReadExt},
};

#[tokio::main]
async fn main() {
    let _ = tracing_subscriber::fmt::try_init();

    let mut args = env::args();

    let (key_file, domain, selector, identity) = match (
        args.next().as_deref(),
        args.next(),
        args.next(),
        args.next(),
        args.next(),
        args.next(),
    ) {
        (_, Some(key_file), Some(domain), Some(selector), identity, None) => {
            (key_file, domain, selector, identity.unwrap_or_default())
        }
        (program, ..) => {
            eprintln!(
                "usage: {} <key_file> <domain> <selector> [<identity>]",
                program.unwrap_or("dkimsign")
            );
            process::exit(1);
        }
    };

    let key_pem = fs::read(key_file).await.unwrap();

    let mut request = SignRequest::new(domain, identity, selector, key_pem);
    if env::var_os("DKIMSIGN_BODY_LENGTH").is_some() {
        request.body_length = BodyLength::OnlyMessageLength;
    }

    let mut msg = String::new();
    let n = io::stdin().read_to_string(&mut msg).await.unwrap();
    assert!(n > 0, "empty message on stdin");

    let msg = msg.replace("\r\n", "\n");

    let (header, body) = msg.split_once("\n\n").unwrap_or((msg.as_str(), ""));

    let headers: HeaderFields = header.parse().unwrap();
    let body = body.replace('\n', "\r\n");

    match Signer::new(request).sign(&headers, body.as_bytes()) {
        Ok(result) => println!("{}", result.format_header().replace("\r\n", "\n")),
        Err(error) => {
            eprintln!("ERROR: {error}");
            process::exit(1);
        }
    }
}
