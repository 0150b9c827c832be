use base64ct::{Base64, Encoding};
use dmail::{
    canonicalize,
    header::{HeaderField, HeaderFields},
    signature::CanonicalizationAlgorithm,
    SigningKey, SigningResult,
};
use rsa::Pkcs1v15Sign;
use sha2::{Digest, Sha256};
use std::{collections::HashMap, io};
use tokio::fs;

pub async fn read_key_file(file_name: &str) -> io::Result<Vec<u8>> {
    fs::read(file_name).await
}

/// Header fields with repeated names in mixed case, and two fields that are
/// never signed.
pub fn make_header_fields() -> HeaderFields {
    let fields = [
        ("From", "a"),
        ("To", "b"),
        ("Subject", "c"),
        ("to", "d"),
        ("To", "e"),
        ("subject", "f"),
        ("Subject", "g"),
        ("to", "h"),
        ("Test", "i"),
        ("test", "j"),
    ];

    HeaderFields::from_vec(
        fields
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect(),
    )
    .unwrap()
}

pub fn make_body() -> Vec<u8> {
    b"\r\nabc\r\nabc\r\n\r\n".to_vec()
}

pub fn parse_tags(value: &str) -> Vec<(String, String)> {
    value
        .replace("\r\n ", "")
        .split(';')
        .map(|tag| {
            let (name, value) = tag.split_once('=').unwrap();
            (name.trim().to_owned(), value.trim().to_owned())
        })
        .collect()
}

/// Checks a relaxed/* signature the way a receiving verifier does: signed
/// header names are matched against header occurrences from the bottom up,
/// names without a remaining occurrence contribute nothing.
pub fn verify(headers: &HeaderFields, body: &[u8], result: &SigningResult, key_pem: &[u8]) -> bool {
    let tags: HashMap<_, _> = parse_tags(&result.header_value).into_iter().collect();

    let (header_canon, body_canon) = tags["c"].split_once('/').unwrap();
    assert_eq!(header_canon, "relaxed");
    let body_canon: CanonicalizationAlgorithm = body_canon.parse().unwrap();

    let canonical_body = canonicalize::canonicalize_body(body_canon, body);
    if Base64::encode_string(&Sha256::digest(&canonical_body)) != tags["bh"] {
        return false;
    }
    if let Some(len) = tags.get("l") {
        if len.parse::<usize>().unwrap() != canonical_body.len() {
            return false;
        }
    }

    let fields: &[HeaderField] = headers.as_ref();
    let mut remaining: HashMap<String, usize> = HashMap::new();
    let mut data = vec![];

    for name in tags["h"].split(':').map(|n| n.trim().to_ascii_lowercase()) {
        let end = remaining.get(&name).copied().unwrap_or(fields.len());
        let found = fields[..end].iter().rposition(|(n, _)| *n == name.as_str());
        remaining.insert(name.clone(), found.unwrap_or(0));

        if let Some(i) = found {
            let value = canonicalize::canonicalize_header(
                CanonicalizationAlgorithm::Relaxed,
                fields[i].1.as_ref(),
            );
            data.extend(format!("{name}:{value}\r\n").into_bytes());
        }
    }

    let value =
        canonicalize::canonicalize_header(CanonicalizationAlgorithm::Relaxed, &result.header_value);
    let b_index = value.rfind("; b=").unwrap() + "; b=".len();
    data.extend(b"dkim-signature:");
    data.extend(value[..b_index].as_bytes());

    let signature = Base64::decode_vec(&tags["b"]).unwrap();

    let public_key = SigningKey::from_pkcs1_pem(key_pem).unwrap().to_public_key();
    public_key
        .verify(Pkcs1v15Sign::new::<Sha256>(), &Sha256::digest(&data), &signature)
        .is_ok()
}
