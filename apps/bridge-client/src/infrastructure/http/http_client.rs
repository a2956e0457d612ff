//! Blocking HTTP transport for the bridge.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::api_types::{
    AccountInfoResponse, ErrorResponse, HealthResponse, RatesRequest, RatesResponse,
    SymbolInfoResponse, SymbolRequest, SymbolsResponse, TickResponse, paths,
};
use crate::application::ports::{BridgeTransport, Endpoint, TransportError};
use crate::domain::{AccountSnapshot, Bar, Granularity, Quote, Symbol, SymbolInfo};

#[derive(Debug)]
struct Session {
    client: Client,
    base_url: String,
    endpoint: String,
}

/// `BridgeTransport` over the bridge's JSON-over-HTTP protocol.
///
/// A session is an HTTP client bound to one endpoint whose health check
/// reported a live terminal. Every call uses the timeout given at handshake.
#[derive(Debug, Default)]
pub struct HttpBridgeTransport {
    session: Option<Session>,
}

impl HttpBridgeTransport {
    /// Create a transport with no open session.
    #[must_use]
    pub const fn new() -> Self {
        Self { session: None }
    }

    fn session(&self) -> Result<&Session, TransportError> {
        self.session.as_ref().ok_or(TransportError::NoSession)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let session = self.session()?;
        let request = session.client.get(format!("{}{path}", session.base_url));
        execute(request, &session.endpoint, None)
    }

    fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        symbol: &Symbol,
    ) -> Result<T, TransportError> {
        let session = self.session()?;
        let request = session
            .client
            .post(format!("{}{path}", session.base_url))
            .json(body);
        execute(request, &session.endpoint, Some(symbol))
    }
}

impl BridgeTransport for HttpBridgeTransport {
    fn handshake(&mut self, endpoint: &Endpoint, timeout: Duration) -> Result<(), TransportError> {
        self.session = None;

        let target = endpoint.to_string();
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| TransportError::Unreachable {
                endpoint: target.clone(),
                message: e.to_string(),
            })?;

        let base_url = endpoint.base_url();
        let request = client.get(format!("{base_url}{}", paths::HEALTH));
        let health: HealthResponse = execute(request, &target, None)?;

        if !health.is_ready() {
            return Err(TransportError::Unhealthy(format!(
                "status={}, terminal_connected={}",
                health.status, health.terminal_connected
            )));
        }

        tracing::debug!(
            endpoint = %target,
            server = health.server.as_deref().unwrap_or("unknown"),
            "Bridge health check passed"
        );

        self.session = Some(Session {
            client,
            base_url,
            endpoint: target,
        });
        Ok(())
    }

    fn account_info(&mut self) -> Result<AccountSnapshot, TransportError> {
        self.get::<AccountInfoResponse>(paths::ACCOUNT_INFO)?
            .into_domain()
    }

    fn tick(&mut self, symbol: &Symbol) -> Result<Quote, TransportError> {
        let body = SymbolRequest {
            symbol: symbol.to_string(),
        };
        self.post::<TickResponse, _>(paths::GET_TICK, &body, symbol)?
            .into_domain(symbol)
    }

    fn rates(
        &mut self,
        symbol: &Symbol,
        granularity: Granularity,
        count: usize,
    ) -> Result<Vec<Bar>, TransportError> {
        let body = RatesRequest {
            symbol: symbol.to_string(),
            timeframe: granularity.as_str().to_string(),
            count,
        };
        self.post::<RatesResponse, _>(paths::GET_RATES, &body, symbol)?
            .into_domain()
    }

    fn symbol_info(&mut self, symbol: &Symbol) -> Result<SymbolInfo, TransportError> {
        let body = SymbolRequest {
            symbol: symbol.to_string(),
        };
        self.post::<SymbolInfoResponse, _>(paths::SYMBOL_INFO, &body, symbol)?
            .into_domain(symbol)
    }

    fn symbols(&mut self) -> Result<Vec<Symbol>, TransportError> {
        self.get::<SymbolsResponse>(paths::SYMBOLS)?.into_domain()
    }

    fn close(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::debug!(endpoint = %session.endpoint, "Bridge session released");
        }
    }
}

/// Send a request and decode the body, mapping failures to `TransportError`.
fn execute<T: DeserializeOwned>(
    request: RequestBuilder,
    endpoint: &str,
    symbol: Option<&Symbol>,
) -> Result<T, TransportError> {
    let response = request.send().map_err(|e| map_send_error(&e, endpoint))?;
    let status = response.status();
    let text = response.text().map_err(|e| map_send_error(&e, endpoint))?;

    if status.is_success() {
        return serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()));
    }

    let error = serde_json::from_str::<ErrorResponse>(&text).ok();

    // Symbol-scoped calls only; the bridge reports unknown symbols with
    // either 404 or 500.
    let unknown = symbol.filter(|symbol| {
        error
            .as_ref()
            .is_some_and(|body| body.names_unknown_symbol(symbol))
    });
    if let Some(symbol) = unknown {
        return Err(TransportError::SymbolNotFound {
            symbol: symbol.to_string(),
        });
    }

    Err(TransportError::Remote {
        status: status.as_u16(),
        message: error.map_or(text, |e| e.error),
    })
}

fn map_send_error(error: &reqwest::Error, endpoint: &str) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(error.to_string())
    } else if error.is_decode() || error.is_body() {
        TransportError::Decode(error.to_string())
    } else {
        TransportError::Unreachable {
            endpoint: endpoint.to_string(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calls_without_session_fail() {
        let mut transport = HttpBridgeTransport::new();
        let symbol = Symbol::new("EURUSD").unwrap();

        assert_eq!(transport.account_info(), Err(TransportError::NoSession));
        assert_eq!(transport.tick(&symbol), Err(TransportError::NoSession));
        assert_eq!(
            transport.rates(&symbol, Granularity::M1, 10),
            Err(TransportError::NoSession)
        );
        assert_eq!(transport.symbols(), Err(TransportError::NoSession));
    }

    #[test]
    fn close_is_idempotent() {
        let mut transport = HttpBridgeTransport::new();
        transport.close();
        transport.close();
        assert!(transport.session.is_none());
    }

    #[test]
    fn closed_port_is_unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let endpoint = Endpoint::new("127.0.0.1", port).unwrap();
        let mut transport = HttpBridgeTransport::new();
        let result = transport.handshake(&endpoint, Duration::from_secs(2));

        assert!(
            matches!(result, Err(TransportError::Unreachable { .. })),
            "unexpected: {result:?}"
        );
        assert!(transport.session.is_none());
    }
}
