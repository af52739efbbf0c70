use std::net::SocketAddr;

use envconfig::Envconfig;

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(default = "127.0.0.1:8080")]
    pub address: SocketAddr,

    // Used for integration tests
    #[envconfig(default = "true")]
    pub export_prometheus: bool,

    // Plane bounds of the rendered region. The defaults frame the whole
    // set; narrower bounds make /work cheaper, deeper zooms make it pricier.
    #[envconfig(default = "-2.0")]
    pub render_lower_r: f64,

    #[envconfig(default = "-1.0")]
    pub render_lower_i: f64,

    #[envconfig(default = "1.0")]
    pub render_upper_r: f64,

    #[envconfig(default = "1.0")]
    pub render_upper_i: f64,

    #[envconfig(default = "20")]
    pub render_lines: usize,

    // High on purpose: the per-request cost is the workload's whole point.
    #[envconfig(default = "131072")]
    pub render_limit: usize,
}
