use std::sync::OnceLock;

use serde::Deserialize;

fn default_deadlock_timeout() -> f64 {
    600.0
}

fn default_backend() -> String {
    "local".to_owned()
}

fn default_num_pes() -> usize {
    1
}

#[derive(Deserialize, Debug)]
pub struct Config {
    /// A general timeout in seconds for various operations which may indicate a deadlock, default: 600.0 seconds
    #[serde(default = "default_deadlock_timeout")]
    pub deadlock_timeout: f64,

    /// flag used to print warnings when a barrier exceeds the deadlock timeout. Default: true
    pub barrier_warning: Option<bool>,

    /// flag used to print warnings when a distributed vector is dropped between
    /// `exchange_begin` and `exchange_finalize`. Default: true
    pub halo_warning: Option<bool>,

    /// The lamellae backend to use
    /// local -- single pe execution, the default
    /// smp -- multi pe execution, each pe is a thread of the calling process
    #[serde(default = "default_backend")]
    pub backend: String, //local,smp

    /// The number of PEs launched by the smp backend, default: 1
    #[serde(default = "default_num_pes")]
    pub num_pes: usize,
}

/// Get the current Environment Variable configuration
pub fn config() -> &'static Config {
    static CONFIG: OnceLock<Config> = OnceLock::new();
    CONFIG.get_or_init(|| match envy::prefixed("LAMELLAR_").from_env::<Config>() {
        Ok(config) => config,
        Err(error) => panic!("{}", error),
    })
}
