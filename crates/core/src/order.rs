//! Order Message
//!
//! The order is placed by handing a pre-formatted text message to an
//! external messaging channel through a deep link. The message is composed
//! as plain text and percent-encoded exactly once when the link is built.

use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::{
    cart::CartLine,
    codes::RewardCoupon,
    pricing::{AppliedCoupon, LineCharge, compute_total, format_amount, price_lines},
    products::Variant,
};

/// Characters escaped in the message text. Everything non-ASCII is always
/// escaped; `*`, `/`, `:`, `(`, `)`, `-` and `.` stay literal.
const MESSAGE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'+')
    .add(b',')
    .add(b';')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Default messaging host.
pub const DEFAULT_MESSAGING_HOST: &str = "wa.me";

/// Default currency symbol prefixed to amounts.
pub const DEFAULT_CURRENCY_SYMBOL: &str = "S/";

/// An order message ready to render.
///
/// Rendering via [`fmt::Display`] produces the plain text: a greeting, one
/// row per charge, the total, the coupon annotation and the reward
/// announcement.
#[derive(Debug, Clone)]
pub struct OrderMessage<'a> {
    lines: &'a [CartLine],
    applied: Option<&'a AppliedCoupon>,
    reward: Option<&'a RewardCoupon>,
    currency: &'a str,
}

impl<'a> OrderMessage<'a> {
    /// A message for `lines`, rendering amounts with `currency`.
    pub fn new(lines: &'a [CartLine], currency: &'a str) -> Self {
        Self {
            lines,
            applied: None,
            reward: None,
            currency,
        }
    }

    /// Price the message under an applied coupon.
    #[must_use]
    pub fn with_coupon(mut self, applied: Option<&'a AppliedCoupon>) -> Self {
        self.applied = applied;
        self
    }

    /// Announce a reward coupon at the end of the message.
    #[must_use]
    pub fn with_reward(mut self, reward: Option<&'a RewardCoupon>) -> Self {
        self.reward = reward;
        self
    }

    /// The rendered item rows, without greeting or footer.
    pub fn rows(&self) -> Vec<String> {
        price_lines(self.lines, self.applied)
            .iter()
            .flat_map(|priced| {
                priced
                    .charges
                    .iter()
                    .map(|charge| self.row(&priced.line.name, &priced.line.variant, charge))
            })
            .collect()
    }

    fn row(&self, name: &str, variant: &Variant, charge: &LineCharge) -> String {
        let mut row = format!("{}x {name}", charge.quantity);

        let annotations: Vec<&str> = [variant.color.as_deref(), variant.size.as_deref()]
            .into_iter()
            .flatten()
            .collect();

        if !annotations.is_empty() {
            row.push_str(&format!(" ({})", annotations.join(", ")));
        }

        row.push_str(&format!(
            " - {}{}",
            self.currency,
            format_amount(charge.amount())
        ));

        if let Some(applied) = self.applied.filter(|_| charge.discounted) {
            row.push_str(&format!(" ({} off)", applied.discount()));
        }

        row
    }
}

impl fmt::Display for OrderMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hi! I'd like to place this order:")?;
        writeln!(f)?;

        for row in self.rows() {
            writeln!(f, "{row}")?;
        }

        let total = compute_total(self.lines, self.applied);

        writeln!(f)?;
        write!(f, "*Total: {}{}*", self.currency, format_amount(total))?;

        if let Some(applied) = self
            .applied
            .filter(|applied| applied.resolve(self.lines).is_some())
        {
            write!(f, "\nCoupon {} ({})", applied.coupon.code, applied.discount())?;
        }

        if let Some(reward) = self.reward {
            write!(
                f,
                "\n\n*CONGRATULATIONS!*\nYou earned a reward coupon:\n*{}*\n\nShow it on your next order",
                reward.code
            )?;
        }

        Ok(())
    }
}

/// Percent-encode message text for the deep link query.
///
/// Spaces become `%20`, newlines `%0A` and `%` becomes `%25`. Input is
/// expected to be plain text; encoding it twice double-escapes.
pub fn encode_message(text: &str) -> String {
    utf8_percent_encode(text, MESSAGE).to_string()
}

/// Build `https://<host>/<destination>?text=<encoded message>`.
pub fn deep_link(host: &str, destination: &str, message: &str) -> String {
    format!(
        "https://{host}/{}?text={}",
        utf8_percent_encode(destination.trim(), MESSAGE),
        encode_message(message)
    )
}
