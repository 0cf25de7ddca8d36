//! Global tick
//!
//! Posts a tick event at the configured rate (10 Hz by default).

use defmt::*;
use embassy_time::{Duration, Ticker};
use vigil_core::Dispatch;

use crate::config::TICK_PERIOD_MS;
use crate::node::{Waking, EV_TICK};

#[embassy_executor::task]
pub async fn tick_task(events: Waking) {
    info!("Tick task started ({} ms)", TICK_PERIOD_MS);

    let mut ticker = Ticker::every(Duration::from_millis(TICK_PERIOD_MS));

    loop {
        ticker.next().await;

        // A full queue already logged the drop
        let _ = events.dispatch(EV_TICK, None);
    }
}
