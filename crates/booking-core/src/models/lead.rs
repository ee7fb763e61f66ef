//! Lead contact projections
//!
//! Leads are owned by lead management; the booking engine only reads these
//! projections of them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Contact summary shown next to lead visits in listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadContactSummary {
    pub lead_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl LeadContactSummary {
    /// Single-line "name · phone · address" rendering, skipping absent parts
    pub fn display(&self) -> String {
        let mut parts = vec![self.name.as_str()];
        parts.extend(
            [self.phone.as_deref(), self.address.as_deref()]
                .into_iter()
                .flatten()
                .filter(|p| !p.trim().is_empty()),
        );
        parts.join(" · ")
    }
}

/// Consumer contact used for visit invites
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerContact {
    pub name: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_display() {
        let full = LeadContactSummary {
            lead_id: Uuid::new_v4(),
            name: "Jan de Vries".to_string(),
            phone: Some("+31 6 1234 5678".to_string()),
            address: Some("Keizersgracht 1, Amsterdam".to_string()),
        };
        assert_eq!(
            full.display(),
            "Jan de Vries · +31 6 1234 5678 · Keizersgracht 1, Amsterdam"
        );

        let name_only = LeadContactSummary {
            phone: None,
            address: Some(" ".to_string()),
            ..full
        };
        assert_eq!(name_only.display(), "Jan de Vries");
    }
}
