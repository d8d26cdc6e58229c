use std::env;
use std::error::Error;
use std::str::FromStr;

pub trait FromEnv: Sized {
    fn from_env(env_var: &str) -> anyhow::Result<Self>;

    /// Falls back to `default` when the variable is unset.
    fn from_env_or(env_var: &str, default: Self) -> anyhow::Result<Self> {
        match env::var(env_var) {
            Err(env::VarError::NotPresent) => Ok(default),
            _ => Self::from_env(env_var),
        }
    }
}

impl<T: FromStr> FromEnv for T
where
    <T as FromStr>::Err: 'static + Error + Send + Sync,
{
    fn from_env(env_var: &str) -> anyhow::Result<Self> {
        let value = env::var(env_var)?;
        Ok(T::from_str(value.trim())?)
    }
}

pub fn optional_env(env_var: &str) -> Option<String> {
    env::var(env_var).ok().filter(|value| !value.trim().is_empty())
}
