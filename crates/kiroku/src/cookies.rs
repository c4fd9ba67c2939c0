use std::path::Path;

use crate::error::KirokuResult;

/// Read `name=value` pairs from a Netscape cookie jar.
pub fn load_cookies<P>(path: P) -> KirokuResult<Vec<(String, String)>>
where
    P: AsRef<Path>,
{
    let data = std::fs::read_to_string(path)?;
    Ok(parse_cookies(&data))
}

/// Comment lines and lines with fewer than 7 tab separated fields are
/// ignored. A cookie seen twice keeps its first position and last value.
pub fn parse_cookies(data: &str) -> Vec<(String, String)> {
    let mut cookies: Vec<(String, String)> = Vec::new();

    for line in data.lines() {
        if line.starts_with('#') {
            continue;
        }

        // domain, subdomains, path, secure, expires, name, value
        let fields: Vec<_> = line.trim().split('\t').collect();
        if fields.len() < 7 {
            continue;
        }
        let (name, value) = (fields[5], fields[6]);

        match cookies.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => cookies.push((name.to_string(), value.to_string())),
        }
    }

    cookies
}
