/*! Integration tests for Keeper.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * - backend: the VaultBackend contract, run against the TEST_BACKEND matrix
 * - identity: registration, authentication and token lifetime through the service
 * - protocol: the RPC surface as seen by a client, including owner scoping
 * - workflow: the two-step save/retrieve workflows and their failure paths
 * - http: the same flows over a real HTTP server on an ephemeral port
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("keeper=info".parse().unwrap()))
        .with_test_writer()
        .try_init();
}

mod helpers;
mod http;
mod identity;
mod protocol;
mod workflow;
