//! Readiness gate between the Local Server and the window.
//!
//! The window must not navigate until something accepts TCP connections at
//! the server address. The gate polls with short connection attempts and
//! gives up after [`ReadinessPolicy::timeout`].

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::config::{ReadinessPolicy, ServerConfig};
use crate::error::ReadinessError;

/// Block until `config.host:config.port` accepts a connection.
///
/// Returns the time spent waiting.
pub fn wait_for_server(
    config: &ServerConfig,
    policy: &ReadinessPolicy,
) -> Result<Duration, ReadinessError> {
    let addr = resolve(&config.address())?;
    wait_for_listener(addr, policy)
}

/// Block until `addr` accepts a connection or the policy's timeout passes.
///
/// The first attempt is made immediately. A failed attempt is followed by a
/// pause of `policy.interval`, cut short so the total never overshoots the
/// deadline by more than one connect timeout.
pub fn wait_for_listener(
    addr: SocketAddr,
    policy: &ReadinessPolicy,
) -> Result<Duration, ReadinessError> {
    let started = Instant::now();
    let deadline = started + policy.timeout;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match TcpStream::connect_timeout(&addr, policy.connect_timeout) {
            Ok(_) => {
                let elapsed = started.elapsed();
                info!("[ready] {addr} reachable after {attempts} attempt(s) in {elapsed:?}");
                return Ok(elapsed);
            }
            Err(e) => debug!("[ready] attempt {attempts} on {addr}: {e}"),
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(ReadinessError::Timeout {
                addr,
                attempts,
                elapsed: started.elapsed(),
            });
        }
        thread::sleep(policy.interval.min(deadline - now));
    }
}

fn resolve(addr: &str) -> Result<SocketAddr, ReadinessError> {
    addr.to_socket_addrs()
        .map_err(|source| ReadinessError::Resolve {
            addr: addr.to_string(),
            source,
        })?
        .next()
        .ok_or_else(|| ReadinessError::NoAddress {
            addr: addr.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn quick_policy(timeout_ms: u64) -> ReadinessPolicy {
        ReadinessPolicy {
            timeout: Duration::from_millis(timeout_ms),
            interval: Duration::from_millis(20),
            connect_timeout: Duration::from_millis(50),
        }
    }

    /// Reserve a loopback port, then release it so nothing listens there.
    fn dead_port() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr")
    }

    #[test]
    fn succeeds_immediately_when_listening() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let elapsed = wait_for_listener(addr, &quick_policy(1_000)).expect("ready");
        assert!(elapsed < Duration::from_millis(500));
    }

    #[test]
    fn fails_without_hanging_when_nothing_listens() {
        let addr = dead_port();
        let started = Instant::now();
        let err = wait_for_listener(addr, &quick_policy(200)).unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(2));
        match err {
            ReadinessError::Timeout { attempts, .. } => assert!(attempts >= 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn succeeds_once_a_late_listener_appears() {
        let addr = dead_port();
        let late = thread::spawn(move || {
            thread::sleep(Duration::from_millis(150));
            let listener = TcpListener::bind(addr).expect("late bind");
            thread::sleep(Duration::from_millis(500));
            drop(listener);
        });

        let elapsed = wait_for_listener(addr, &quick_policy(2_000)).expect("ready");
        assert!(elapsed >= Duration::from_millis(100));
        late.join().expect("listener thread");
    }

    #[test]
    fn unresolvable_host_is_reported() {
        let config = ServerConfig {
            host: "host.invalid".to_string(),
            port: 1,
            root_dir: std::env::temp_dir(),
        };
        let err = wait_for_server(&config, &quick_policy(100)).unwrap_err();
        assert!(matches!(
            err,
            ReadinessError::Resolve { .. } | ReadinessError::NoAddress { .. }
        ));
    }
}
