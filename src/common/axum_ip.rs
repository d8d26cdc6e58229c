use crate::common::error::{AppError, ServiceResult};
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

#[derive(Debug, Clone, Copy)]
pub struct IpAddrInfo {
    pub ip_addr: IpAddr,
}

fn forwarded_ip(header: &str) -> Option<&str> {
    header.split(',').next().map(str::trim)
}

async fn get_ip_addr(parts: &mut Parts) -> ServiceResult<IpAddrInfo> {
    if let Some(ip) = parts.headers.get("CF-Connecting-IP") {
        let ip_addr = IpAddr::from_str(ip.to_str()?.trim())?;
        Ok(IpAddrInfo { ip_addr })
    } else if let Some(ip) = parts.headers.get("X-Forwarded-For") {
        let ip = forwarded_ip(ip.to_str()?).ok_or(AppError::DecodingRequestFailed)?;
        let ip_addr = IpAddr::from_str(ip)?;
        Ok(IpAddrInfo { ip_addr })
    } else {
        let info = <ConnectInfo<SocketAddr>>::from_request_parts(parts, &()).await?;
        let ip_addr = info.ip();
        Ok(IpAddrInfo { ip_addr })
    }
}

impl<S: Sync + Send> FromRequestParts<S> for IpAddrInfo {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        get_ip_addr(parts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: (&str, &str)) -> ServiceResult<IpAddrInfo> {
        let request = Request::builder()
            .header(header.0, header.1)
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        IpAddrInfo::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn first_forwarded_address_wins() {
        let info = extract(("X-Forwarded-For", "203.0.113.7, 10.0.0.1")).await.unwrap();
        assert_eq!(info.ip_addr, IpAddr::from([203, 0, 113, 7]));
    }

    #[tokio::test]
    async fn cloudflare_header_is_preferred() {
        let info = extract(("CF-Connecting-IP", "198.51.100.2")).await.unwrap();
        assert_eq!(info.ip_addr, IpAddr::from([198, 51, 100, 2]));
    }

    #[tokio::test]
    async fn garbage_addresses_are_rejected() {
        assert!(extract(("X-Forwarded-For", "not-an-ip")).await.is_err());
    }
}
