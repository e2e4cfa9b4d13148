use super::{decode_countries, CountryStat};
use crate::error::FetchError;
use std::time::Duration;
use tracing::debug;

/// Anything that can produce the current per-country statistics
pub trait StatsSource: Send + Sync {
    fn fetch(&self) -> Result<Vec<CountryStat>, FetchError>;
}

/// Fetches statistics with a single HTTP GET against a fixed endpoint
pub struct HttpStatsSource {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpStatsSource {
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(concat!("covid-map/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            endpoint: endpoint.into(),
            client: builder.build()?,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl StatsSource for HttpStatsSource {
    fn fetch(&self) -> Result<Vec<CountryStat>, FetchError> {
        debug!(endpoint = %self.endpoint, "GET countries");
        let response = self.client.get(&self.endpoint).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let mut body = response.bytes()?.to_vec();
        debug!(bytes = body.len(), "received countries payload");
        decode_countries(&mut body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve exactly one canned HTTP response on a local port
    fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            // Drain request headers
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap_or(0) > 2 {
                line.clear();
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        });

        format!("http://{addr}/v2/countries")
    }

    #[test]
    fn test_fetch_success() {
        let url = serve_once(
            "200 OK",
            r#"[{"country":"A","cases":100,"countryInfo":{"lat":1,"long":1}}]"#,
        );
        let source = HttpStatsSource::new(url, Some(Duration::from_secs(5))).unwrap();
        let stats = source.fetch().unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].country, "A");
        assert_eq!(stats[0].cases, 100);
    }

    #[test]
    fn test_fetch_non_2xx() {
        let url = serve_once("500 Internal Server Error", "oops");
        let source = HttpStatsSource::new(url, Some(Duration::from_secs(5))).unwrap();
        assert!(matches!(source.fetch(), Err(FetchError::Status(500))));
    }

    #[test]
    fn test_fetch_malformed() {
        let url = serve_once("200 OK", "not json");
        let source = HttpStatsSource::new(url, Some(Duration::from_secs(5))).unwrap();
        assert!(matches!(source.fetch(), Err(FetchError::Decode(_))));
    }

    #[test]
    fn test_fetch_connection_refused() {
        // Bind then drop to get a port nobody listens on
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let source = HttpStatsSource::new(format!("http://{addr}/"), Some(Duration::from_secs(2))).unwrap();
        assert!(matches!(source.fetch(), Err(FetchError::Transport(_))));
    }
}
