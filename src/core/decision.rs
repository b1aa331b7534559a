use serde::Serialize;

use crate::models::{FruitPriceReport, PriceSnapshot};
use crate::plugins::traits::{Dispatcher, Notification};
use crate::utils::error::AppError;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NotifyOutcome {
    Sent {
        recipient: String,
        fruits: Vec<String>,
        message_id: Option<String>,
    },
    NothingToNotify,
    /// Recorded by callers that keep going after a failed dispatch.
    Failed {
        recipient: String,
        error: String,
    },
}

impl NotifyOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, NotifyOutcome::Failed { .. })
    }
}

/// Successful reports whose weekly price is under the yearly average, in input order.
pub fn decide(reports: &[FruitPriceReport]) -> Vec<FruitPriceReport> {
    reports
        .iter()
        .filter(|report| report.is_currently_cheap())
        .cloned()
        .collect()
}

/// One paragraph per cheap fruit, separated by a blank line. `None` when nothing qualifies.
pub fn compose_body(cheap: &[FruitPriceReport]) -> Option<String> {
    let paragraphs: Vec<String> = cheap
        .iter()
        .filter_map(FruitPriceReport::as_success)
        .filter(|snapshot| snapshot.is_currently_cheap())
        .map(paragraph)
        .collect();

    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join("\n\n"))
    }
}

fn paragraph(snapshot: &PriceSnapshot) -> String {
    format!(
        "🐶 汪！你喜歡的 {} 最近便宜了汪，我幫你聞到了汪！\n\
         （ 週期：{}，成交價：{:.1} 元，全年度平均成交價：{:.1} 元 ）",
        snapshot.fruit(),
        snapshot.weekly().period,
        snapshot.weekly().average_price,
        snapshot.year().average_price,
    )
}

/// Picks the cheap reports and, when there are any, sends one combined message.
pub async fn notify(
    dispatcher: &dyn Dispatcher,
    to: &str,
    subject: &str,
    reports: &[FruitPriceReport],
) -> Result<(Vec<FruitPriceReport>, NotifyOutcome), AppError> {
    let cheap = decide(reports);

    let Some(body) = compose_body(&cheap) else {
        tracing::info!("No fruit under its yearly average, nothing to send");
        metrics::counter!("veggie_notifications_total", "outcome" => "skipped").increment(1);
        return Ok((cheap, NotifyOutcome::NothingToNotify));
    };

    let notification = Notification {
        to: to.to_string(),
        subject: subject.to_string(),
        body,
    };

    let result = match dispatcher.dispatch(&notification).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(recipient = to, "Notification failed: {}", e);
            metrics::counter!("veggie_notifications_total", "outcome" => "failed").increment(1);
            return Err(e);
        }
    };

    metrics::counter!("veggie_notifications_total", "outcome" => "sent").increment(1);
    tracing::info!(recipient = to, fruits = cheap.len(), "Price alert sent");

    let fruits = cheap.iter().map(|report| report.fruit().to_string()).collect();
    Ok((
        cheap,
        NotifyOutcome::Sent {
            recipient: to.to_string(),
            fruits,
            message_id: result.message_id,
        },
    ))
}
