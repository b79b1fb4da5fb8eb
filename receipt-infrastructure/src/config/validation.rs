use anyhow::{anyhow, Result};

pub fn validate_http_url(name: &str, value: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("{} must not be empty", name));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(anyhow!("{} must be an http(s) URL, got '{}'", name, trimmed));
    }
    Ok(())
}

pub fn validate_database_url(value: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("database_url must not be empty"));
    }
    let supported = ["postgres://", "postgresql://", "sqlite:"];
    if !supported.iter().any(|scheme| trimmed.starts_with(scheme)) {
        return Err(anyhow!(
            "database_url must start with postgres://, postgresql:// or sqlite:"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_urls() {
        assert!(validate_http_url("storage_endpoint", "http://localhost:9000").is_ok());
        assert!(validate_http_url("storage_endpoint", "localhost:9000").is_err());
        assert!(validate_http_url("storage_endpoint", "").is_err());
    }

    #[test]
    fn database_urls() {
        assert!(validate_database_url("postgresql://u:p@localhost:5566/postgres").is_ok());
        assert!(validate_database_url("sqlite://receipts.db").is_ok());
        assert!(validate_database_url("mysql://localhost/db").is_err());
    }
}
