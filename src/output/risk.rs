//! Risk report output

use serde::Serialize;
use std::io::{self, Write};

use crate::risk::{by_severity, RiskyPermission, Severity};
use crate::subject::Subject;

/// Print risks grouped by severity, most severe first
pub fn print_risks(out: &mut dyn Write, risks: &[RiskyPermission]) -> io::Result<()> {
    if risks.is_empty() {
        return writeln!(out, "No risky permissions detected.");
    }

    writeln!(out, "Found {} risky permission pattern(s):", risks.len())?;
    writeln!(out)?;

    for severity in Severity::ALL {
        let group = by_severity(risks, severity);
        if group.is_empty() {
            continue;
        }
        writeln!(out, "{}:", severity.as_str().to_uppercase())?;
        for risk in group {
            writeln!(out, "  - {}", risk.category)?;
            writeln!(out, "    {}", risk.description)?;
            writeln!(out, "    Granted via:")?;
            for grant in &risk.grants {
                writeln!(
                    out,
                    "      - {}/{} -> {}/{}",
                    grant.binding.kind, grant.binding.name, grant.role.kind, grant.role.name
                )?;
            }
            writeln!(out)?;
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct RiskReport<'a> {
    subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
    risks: &'a [RiskyPermission],
}

/// Print risks as a JSON document
pub fn print_risks_json(
    out: &mut dyn Write,
    subject: &Subject,
    namespace: Option<&str>,
    risks: &[RiskyPermission],
) -> io::Result<()> {
    let report = RiskReport {
        subject: subject.to_string(),
        namespace,
        risks,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::{Binding, Grant, PolicyRule, Role, RoleRef};
    use crate::risk::classify;
    use serde_json::Value;

    fn risky_grants() -> Vec<Grant> {
        let admin = PolicyRule::new(["*"]).with_api_groups(["*"]).with_resources(["*"]);
        let csr = PolicyRule::new(["approve"])
            .with_api_groups(["certificates.k8s.io"])
            .with_resources(["certificatesigningrequests/approval"]);
        vec![
            Grant::new(
                &Binding::role_binding("ops", "approvers", RoleRef::cluster_role("csr-approver")),
                &Role::cluster_role("csr-approver"),
                &csr,
            ),
            Grant::new(
                &Binding::cluster_role_binding("admins", "cluster-admin"),
                &Role::cluster_role("cluster-admin"),
                &admin,
            ),
        ]
    }

    #[test]
    fn test_no_risks() {
        let mut buf = Vec::new();
        print_risks(&mut buf, &[]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "No risky permissions detected.\n");
    }

    #[test]
    fn test_grouped_by_severity() {
        let risks = classify(&risky_grants());
        let mut buf = Vec::new();
        print_risks(&mut buf, &risks).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with(&format!("Found {} risky permission pattern(s):\n\n", risks.len())));
        let critical = text.find("CRITICAL:").unwrap();
        let high = text.find("HIGH:").unwrap();
        assert!(critical < high);
        assert!(!text.contains("MEDIUM:"));
        assert!(text.contains(
            "  - cluster-admin\n    Wildcard access grants full cluster control (cluster-admin equivalent)\n    Granted via:\n      - ClusterRoleBinding/admins -> ClusterRole/cluster-admin\n"
        ));
        assert!(text.contains("      - RoleBinding/approvers -> ClusterRole/csr-approver\n"));
    }

    #[test]
    fn test_json_report() {
        let risks = classify(&risky_grants());
        let mut buf = Vec::new();
        print_risks_json(&mut buf, &Subject::user("jane"), Some("ops"), &risks).unwrap();
        let value: Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["subject"], "User jane");
        assert_eq!(value["namespace"], "ops");
        assert_eq!(value["risks"][0]["category"], "csr-approve");
        assert_eq!(value["risks"][0]["severity"], "high");
    }
}
