use shared::{Plan, PlanInterval};
use std::fmt;

use crate::context::PortalContext;
use crate::error::PortalError;

/// Billing cycle toggle on the pricing page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BillingCycle {
    #[default]
    Monthly,
    Yearly,
}

impl BillingCycle {
    pub fn interval(self) -> PlanInterval {
        match self {
            BillingCycle::Monthly => PlanInterval::Month,
            BillingCycle::Yearly => PlanInterval::Year,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            BillingCycle::Monthly => BillingCycle::Yearly,
            BillingCycle::Yearly => BillingCycle::Monthly,
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BillingCycle::Monthly => f.write_str("monthly"),
            BillingCycle::Yearly => f.write_str("yearly"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PricingView {
    pub plans: Vec<Plan>,
    pub cycle: BillingCycle,
    /// Index into `filtered()`
    pub cursor: usize,
    pub loading: bool,
}

impl PricingView {
    pub fn new() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    /// A failed fetch leaves an empty catalog; the view then shows its
    /// "no plans" message.
    pub fn apply_catalog(&mut self, result: Result<Vec<Plan>, PortalError>) {
        self.loading = false;
        self.plans = match result {
            Ok(plans) => plans,
            Err(e) => {
                tracing::warn!("Failed to fetch plans: {}", e);
                Vec::new()
            }
        };
        self.cursor = 0;
    }

    pub fn set_cycle(&mut self, cycle: BillingCycle) {
        if self.cycle != cycle {
            self.cycle = cycle;
            self.cursor = 0;
        }
    }

    /// Plans for the current cycle, cheapest first
    pub fn filtered(&self) -> Vec<&Plan> {
        filter_plans(&self.plans, self.cycle)
    }

    pub fn most_popular(&self) -> Option<&Plan> {
        most_popular(&self.filtered())
    }

    pub fn empty_message(&self) -> String {
        format!("No {} plans available at the moment.", self.cycle)
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.filtered().len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let next = (self.cursor as isize + delta).rem_euclid(len as isize);
        self.cursor = next as usize;
    }

    /// Plan id to preselect on the signup form
    pub fn select_plan(&self) -> Option<String> {
        self.filtered().get(self.cursor).map(|p| p.plan_id.clone())
    }
}

pub fn filter_plans(plans: &[Plan], cycle: BillingCycle) -> Vec<&Plan> {
    let interval = cycle.interval();
    let mut filtered: Vec<&Plan> = plans.iter().filter(|p| p.interval == interval).collect();
    filtered.sort_by_key(|p| p.price);
    filtered
}

/// Highlighted plan: the first whose name mentions premium or pro, else the
/// middle of the price-sorted list.
pub fn most_popular<'a>(sorted: &[&'a Plan]) -> Option<&'a Plan> {
    if sorted.is_empty() {
        return None;
    }
    sorted
        .iter()
        .find(|p| {
            let name = p.name.to_lowercase();
            name.contains("premium") || name.contains("pro")
        })
        .or_else(|| sorted.get(sorted.len() / 2))
        .copied()
}

/// Cheapest plan across the whole catalog
pub fn lowest_priced(plans: &[Plan]) -> Option<&Plan> {
    plans.iter().filter(|p| p.is_active).min_by_key(|p| p.price)
}

pub fn plan_features(name: &str) -> &'static [&'static str] {
    let name = name.to_lowercase();
    if name.contains("basic") {
        &[
            "50,000+ Movies & TV Shows",
            "1080p HD Streaming",
            "2 Simultaneous Streams",
            "24/7 Content Requests",
            "Mobile & TV Apps",
            "Email Support",
        ]
    } else if name.contains("premium") || name.contains("pro") {
        &[
            "50,000+ Movies & TV Shows",
            "4K HDR + Dolby Vision",
            "5 Simultaneous Streams",
            "Priority Content Requests",
            "All Device Support",
            "Family Profiles",
            "Priority Support",
        ]
    } else if name.contains("ultimate") || name.contains("enterprise") {
        &[
            "50,000+ Movies & TV Shows",
            "4K HDR + Dolby Atmos",
            "Unlimited Streams",
            "Instant Content Requests",
            "All Device Support",
            "Unlimited Family Profiles",
            "Dedicated Support",
            "Custom Server Options",
        ]
    } else {
        &[
            "50,000+ Movies & TV Shows",
            "HD Streaming",
            "Multiple Device Support",
            "Content Requests",
            "Email Support",
        ]
    }
}

/// Format a minor-unit amount, e.g. `999, "usd"` -> `$9.99`.
/// Currencies without a known symbol get their upper-case code.
pub fn format_price(minor: i64, currency: &str) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    let whole = group_thousands(abs / 100);
    let cents = abs % 100;
    let code = currency.trim().to_ascii_uppercase();
    let symbol = match code.as_str() {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        _ => None,
    };
    match symbol {
        Some(symbol) => format!("{}{}{}.{:02}", sign, symbol, whole, cents),
        None => format!("{}{} {}.{:02}", sign, code, whole, cents),
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub async fn load_catalog(ctx: &PortalContext) -> Result<Vec<Plan>, PortalError> {
    ctx.client.subscription_plans().await
}
