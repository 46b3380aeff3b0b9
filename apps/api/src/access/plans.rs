//! Paid plans offered on the paywall, and what each one grants once approved.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Pack3,
    #[default]
    Monthly,
    Yearly,
}

/// What an approved plan adds to the buyer's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanGrant {
    Credits(i32),
    PremiumDays(i64),
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanInfo {
    pub id: Plan,
    pub name: &'static str,
    /// Price in cêntimos of Kwanza.
    pub price_cents: u64,
    pub price_label: String,
    pub features: &'static [&'static str],
}

impl Plan {
    pub const ALL: [Plan; 3] = [Plan::Pack3, Plan::Monthly, Plan::Yearly];

    pub fn id(&self) -> &'static str {
        match self {
            Plan::Pack3 => "pack3",
            Plan::Monthly => "monthly",
            Plan::Yearly => "yearly",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "pack3" => Some(Plan::Pack3),
            "monthly" => Some(Plan::Monthly),
            "yearly" => Some(Plan::Yearly),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Plan::Pack3 => "Plano Bronze",
            Plan::Monthly => "Plano Prata",
            Plan::Yearly => "Plano Ouro",
        }
    }

    pub fn price_cents(&self) -> u64 {
        match self {
            Plan::Pack3 => 19_999,
            Plan::Monthly => 99_999,
            Plan::Yearly => 199_999,
        }
    }

    pub fn grant(&self) -> PlanGrant {
        match self {
            Plan::Pack3 => PlanGrant::Credits(3),
            Plan::Monthly => PlanGrant::PremiumDays(30),
            Plan::Yearly => PlanGrant::PremiumDays(365),
        }
    }

    pub fn features(&self) -> &'static [&'static str] {
        match self {
            Plan::Pack3 => &["3 Downloads de CV", "Modelos Premium"],
            Plan::Monthly => &["Downloads Ilimitados", "Suporte VIP"],
            Plan::Yearly => &["Acesso por 12 meses", "Modelos VIP"],
        }
    }

    pub fn info(&self) -> PlanInfo {
        PlanInfo {
            id: *self,
            name: self.name(),
            price_cents: self.price_cents(),
            price_label: format_kwanza(self.price_cents()),
            features: self.features(),
        }
    }
}

/// Formats cêntimos the way prices are shown in Angola: `1.999,99 Kz`.
pub fn format_kwanza(cents: u64) -> String {
    let units = (cents / 100).to_string();
    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, c) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!("{grouped},{:02} Kz", cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_labels() {
        assert_eq!(Plan::Pack3.info().price_label, "199,99 Kz");
        assert_eq!(Plan::Monthly.info().price_label, "999,99 Kz");
        assert_eq!(Plan::Yearly.info().price_label, "1.999,99 Kz");
        assert_eq!(format_kwanza(123_456_700), "1.234.567,00 Kz");
    }

    #[test]
    fn test_grants() {
        assert_eq!(Plan::Pack3.grant(), PlanGrant::Credits(3));
        assert_eq!(Plan::Monthly.grant(), PlanGrant::PremiumDays(30));
        assert_eq!(Plan::Yearly.grant(), PlanGrant::PremiumDays(365));
        assert!(Plan::Pack3.features()[0].starts_with('3'));
    }

    #[test]
    fn test_plan_ids_round_trip() {
        for plan in Plan::ALL {
            assert_eq!(Plan::from_id(plan.id()), Some(plan));
        }
        assert_eq!(Plan::from_id("lifetime"), None);
    }
}
