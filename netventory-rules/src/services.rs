use netventory_types::Severity;
use std::collections::HashMap;

/// One known-insecure service keyed by its well-known port.
#[derive(Debug, Clone)]
pub struct ServiceRule {
    pub name: &'static str,
    pub severity: Severity,
    pub description: &'static str,
}

/// Catalog of ports whose presence alone is a finding.
#[derive(Debug, Clone)]
pub struct ServiceRuleTable {
    rules: HashMap<u16, ServiceRule>,
}

impl ServiceRuleTable {
    pub fn new() -> Self {
        let mut rules = HashMap::new();
        let mut add = |port: u16, name, severity, description| {
            rules.insert(
                port,
                ServiceRule {
                    name,
                    severity,
                    description,
                },
            );
        };

        add(21, "FTP", Severity::High, "Unencrypted file transfer protocol");
        add(23, "Telnet", Severity::Critical, "Unencrypted remote access");
        add(53, "DNS", Severity::Medium, "Potentially vulnerable DNS server");
        add(139, "NetBIOS", Severity::High, "Insecure SMB v1 protocol");
        add(
            445,
            "SMB",
            Severity::High,
            "Potentially vulnerable file sharing protocol",
        );
        add(1433, "MSSQL", Severity::Medium, "Exposed SQL Server database");
        add(3306, "MySQL", Severity::Medium, "Exposed MySQL database");
        add(3389, "RDP", Severity::High, "Exposed Windows remote access");
        add(
            5432,
            "PostgreSQL",
            Severity::Medium,
            "Exposed PostgreSQL database",
        );
        add(
            8080,
            "HTTP Alternate",
            Severity::Medium,
            "Alternate web server without SSL",
        );

        Self { rules }
    }

    pub fn get(&self, port: u16) -> Option<&ServiceRule> {
        self.rules.get(&port)
    }

    pub fn contains(&self, port: u16) -> bool {
        self.rules.contains_key(&port)
    }

    /// Remediation advice for a finding name, when the catalog has any.
    ///
    /// Names outside the fixed lookup fall back to a substring check for SQL
    /// databases; anything else has no specific advice.
    pub fn advice(&self, finding_name: &str) -> Option<String> {
        match finding_name {
            "Telnet" => Some("Disable Telnet and use SSH for secure remote access".into()),
            "FTP" => Some("Migrate to SFTP or FTPS for secure file transfer".into()),
            "SMB" => Some("Upgrade to SMB v3 and disable legacy versions".into()),
            "HTTP without SSL" => Some("Deploy SSL/TLS for all web traffic".into()),
            "RDP" => Some("Restrict RDP access to a VPN or specific source addresses".into()),
            name if name.contains("SQL") => Some(format!(
                "Restrict {name} access to authorized addresses only"
            )),
            _ => None,
        }
    }
}

impl Default for ServiceRuleTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_contents() {
        let table = ServiceRuleTable::new();
        assert_eq!(table.get(23).unwrap().severity, Severity::Critical);
        assert_eq!(table.get(21).unwrap().severity, Severity::High);
        assert_eq!(table.get(3306).unwrap().name, "MySQL");
        assert!(table.get(22).is_none());
        assert!(table.contains(8080));
    }

    #[test]
    fn advice_fixed_names() {
        let table = ServiceRuleTable::new();
        assert!(table.advice("Telnet").unwrap().contains("SSH"));
        assert!(table.advice("HTTP without SSL").unwrap().contains("SSL/TLS"));
        assert!(table.advice("NetBIOS").is_none());
    }

    #[test]
    fn advice_sql_substring() {
        let table = ServiceRuleTable::new();
        assert!(table.advice("MySQL").unwrap().contains("MySQL"));
        assert!(table.advice("PostgreSQL").unwrap().contains("PostgreSQL"));
        assert!(table.advice("MSSQL").is_some());
    }
}
