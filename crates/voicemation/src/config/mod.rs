mod audio_config;
mod behaviour_config;
#[allow(clippy::module_inception)]
mod config;
mod service_config;

pub(crate) use {
    audio_config::AudioConfig, behaviour_config::BehaviourConfig, config::Config,
    service_config::ServiceConfig,
};

pub(crate) const DEFAULT_BASE_URL: &str = "http://localhost:5001";
pub(crate) const DEFAULT_AUTO_OPEN: bool = true;
pub(crate) const DEFAULT_COPY_URL: bool = true;

pub(crate) fn default_base_url() -> String {
    String::from(DEFAULT_BASE_URL)
}

pub(crate) fn default_auto_open() -> bool {
    DEFAULT_AUTO_OPEN
}

pub(crate) fn default_copy_url() -> bool {
    DEFAULT_COPY_URL
}
