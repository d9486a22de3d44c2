//! Agent gateway — queries the HTTP agent running on each hypervisor host.
//!
//! Every probe opens a fresh HTTP/1.1 connection to the host's
//! `gateway_address` and issues all of its queries on it. Agent routes:
//!
//! | Route | Body |
//! |---|---|
//! | `GET /v1/node` | `{"memory_kib": u64, "cpus": u32}` |
//! | `GET /v1/domains?state=active` | `[{"name": str, "memory_kib": u64, "vcpus": u32}]` |
//! | `GET /v1/domains` | same, plus `"active": bool` per domain |
//! | `GET /v1/pools` | `[{"name", "capacity_bytes", "allocation_bytes", "available_bytes"}]` |
//! | `GET /v1/pools/{name}` | one pool, 404 when the pool is absent |

use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Empty};
use hyper::client::conn::http1::{self, SendRequest};
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::debug;

use vdash_state::Host;

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{GatewayConnection, HypervisorGateway};
use crate::types::{DomainInfo, NodeCapacity, PoolInfo, WorkloadUsage};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct NodeInfoBody {
    memory_kib: u64,
    cpus: u32,
}

#[derive(Debug, Deserialize)]
struct DomainBody {
    #[serde(default)]
    name: String,
    memory_kib: u64,
    vcpus: u32,
    #[serde(default)]
    active: bool,
}

#[derive(Debug, Deserialize)]
struct PoolBody {
    name: String,
    capacity_bytes: u64,
    allocation_bytes: u64,
    available_bytes: u64,
}

impl From<PoolBody> for PoolInfo {
    fn from(body: PoolBody) -> Self {
        PoolInfo {
            name: body.name,
            capacity_bytes: body.capacity_bytes,
            allocation_bytes: body.allocation_bytes,
            available_bytes: body.available_bytes,
        }
    }
}

/// Gateway that reaches hosts through their HTTP agent.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    connect_timeout: Duration,
}

impl HttpGateway {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

impl Default for HttpGateway {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl HypervisorGateway for HttpGateway {
    type Connection = HttpConnection;

    async fn connect(&self, host: &Host) -> GatewayResult<HttpConnection> {
        HttpConnection::open(&host.gateway_address, self.connect_timeout).await
    }
}

/// One open HTTP/1.1 connection to a host agent.
///
/// The background connection driver is aborted on drop, so the socket
/// is closed on every exit path.
pub struct HttpConnection {
    address: String,
    sender: SendRequest<Empty<Bytes>>,
    driver: JoinHandle<()>,
}

impl HttpConnection {
    /// Connect and complete the HTTP/1.1 handshake.
    pub async fn open(address: &str, connect_timeout: Duration) -> GatewayResult<Self> {
        let connect_err = |reason: String| GatewayError::Connect {
            address: address.to_string(),
            reason,
        };

        let stream = match tokio::time::timeout(connect_timeout, TcpStream::connect(address)).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(connect_err(e.to_string())),
            Err(_) => return Err(connect_err(format!("timed out after {connect_timeout:?}"))),
        };

        let io = TokioIo::new(stream);
        let (sender, conn) = http1::handshake(io)
            .await
            .map_err(|e| connect_err(format!("handshake: {e}")))?;

        let driver_address = address.to_string();
        let driver = tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(
                    error = %e,
                    address = %driver_address,
                    "gateway connection closed with error"
                );
            }
        });

        debug!(%address, "gateway connection opened");
        Ok(Self {
            address: address.to_string(),
            sender,
            driver,
        })
    }

    async fn get(&mut self, path: &str) -> GatewayResult<(StatusCode, Bytes)> {
        let request_err = |reason: String| GatewayError::Request {
            path: path.to_string(),
            reason,
        };

        self.sender
            .ready()
            .await
            .map_err(|e| request_err(e.to_string()))?;

        let req = http::Request::builder()
            .method("GET")
            .uri(path)
            .header("host", &self.address)
            .header("user-agent", "vdash-gateway/0.1")
            .body(Empty::<Bytes>::new())
            .map_err(|e| request_err(e.to_string()))?;

        let resp = self
            .sender
            .send_request(req)
            .await
            .map_err(|e| request_err(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| request_err(e.to_string()))?
            .to_bytes();

        debug!(address = %self.address, %path, %status, "gateway query answered");
        Ok((status, body))
    }

    async fn get_json<T: DeserializeOwned>(&mut self, path: &str) -> GatewayResult<T> {
        let (status, body) = self.get(path).await?;
        if !status.is_success() {
            return Err(GatewayError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        decode(path, &body)
    }
}

impl Drop for HttpConnection {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

impl GatewayConnection for HttpConnection {
    async fn node_capacity(&mut self) -> GatewayResult<NodeCapacity> {
        let node: NodeInfoBody = self.get_json("/v1/node").await?;
        Ok(NodeCapacity {
            memory_bytes: node.memory_kib.saturating_mul(1024),
            vcpus: node.cpus,
        })
    }

    async fn active_workloads(&mut self) -> GatewayResult<Vec<WorkloadUsage>> {
        let domains: Vec<DomainBody> = self.get_json("/v1/domains?state=active").await?;
        Ok(domains
            .into_iter()
            .map(|d| WorkloadUsage {
                memory_bytes: d.memory_kib.saturating_mul(1024),
                vcpus: d.vcpus,
            })
            .collect())
    }

    async fn pool_free_bytes(&mut self, pool: &str) -> GatewayResult<u64> {
        validate_pool_name(pool)?;
        let path = format!("/v1/pools/{pool}");
        let (status, body) = self.get(&path).await?;
        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::PoolNotFound(pool.to_string()));
        }
        if !status.is_success() {
            return Err(GatewayError::Status {
                path,
                status: status.as_u16(),
            });
        }
        let pool: PoolBody = decode(&path, &body)?;
        Ok(pool.available_bytes)
    }

    async fn list_domains(&mut self) -> GatewayResult<Vec<DomainInfo>> {
        let domains: Vec<DomainBody> = self.get_json("/v1/domains").await?;
        Ok(domains
            .into_iter()
            .map(|d| DomainInfo {
                name: d.name,
                memory_bytes: d.memory_kib.saturating_mul(1024),
                vcpus: d.vcpus,
                active: d.active,
            })
            .collect())
    }

    async fn list_pools(&mut self) -> GatewayResult<Vec<PoolInfo>> {
        let pools: Vec<PoolBody> = self.get_json("/v1/pools").await?;
        let mut pools: Vec<PoolInfo> = pools.into_iter().map(PoolInfo::from).collect();
        pools.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(pools)
    }
}

fn decode<T: DeserializeOwned>(path: &str, body: &[u8]) -> GatewayResult<T> {
    serde_json::from_slice(body).map_err(|e| GatewayError::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

/// Pool names go into the request path verbatim.
fn validate_pool_name(pool: &str) -> GatewayResult<()> {
    let valid = !pool.is_empty()
        && pool
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(GatewayError::InvalidPoolName(pool.to_string()))
    }
}
