//! Networking (Neutron) floating IP calls through the SDK.

use super::client::OpenStackClient;
use super::error::CloudError;
use super::types::FloatingIp;

/// Neutron status of a floating IP not bound to any port.
const UNASSIGNED_STATUS: &str = "DOWN";

impl OpenStackClient {
    /// Lists unassigned floating IPs visible to the project token.
    pub(crate) async fn unassigned_floating_ips(&self) -> Result<Vec<FloatingIp>, CloudError> {
        let listed = self.cloud.find_floating_ips().all().await?;
        let floating_ips = listed.iter().map(|ip| FloatingIp {
            id: ip.id().to_owned(),
            floating_ip_address: ip.floating_ip_address().to_string(),
            status: ip.status().to_string(),
        });
        Ok(unassigned(floating_ips))
    }
}

fn unassigned(floating_ips: impl Iterator<Item = FloatingIp>) -> Vec<FloatingIp> {
    floating_ips
        .filter(|ip| ip.status.eq_ignore_ascii_case(UNASSIGNED_STATUS))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floating_ip(address: &str, status: &str) -> FloatingIp {
        FloatingIp {
            id: format!("fip-{address}"),
            floating_ip_address: address.to_owned(),
            status: status.to_owned(),
        }
    }

    #[test]
    fn only_down_addresses_are_unassigned() {
        let listed = vec![
            floating_ip("203.0.113.1", "ACTIVE"),
            floating_ip("203.0.113.2", "DOWN"),
            floating_ip("203.0.113.3", "ERROR"),
            floating_ip("203.0.113.4", "down"),
        ];
        let free: Vec<String> = unassigned(listed.into_iter())
            .into_iter()
            .map(|ip| ip.floating_ip_address)
            .collect();
        assert_eq!(free, vec!["203.0.113.2", "203.0.113.4"]);
    }
}
