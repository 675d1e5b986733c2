//! Page Expansion
//!
//! Drives the live page until the thread is fully revealed: scroll until the
//! document height stops changing, click any "load more" controls, repeat.
//!
//! ```text
//! Idle -> Scrolling -> Stable -> Expanding -> Scrolling ...
//!                        \
//!                         -> Done
//! ```
//!
//! Every scroll step and every expansion round costs one iteration, and the
//! total never exceeds `max_scroll_iterations`. Scrolling always leaves the
//! last iteration unspent: when it runs out the page is treated as stable, so
//! a page that never stops growing still gets one pass over its "load more"
//! controls. Driver failures end expansion early; they never fail the harvest.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, warn};

use crate::dom;
use crate::locator;
use crate::options::Options;
use crate::page::{ControlHandle, Page};
use crate::result::{ExpansionReport, ExpansionState};

/// Expansion summary plus soft failures.
#[derive(Debug, Default)]
pub struct Expansion {
    /// What happened.
    pub report: ExpansionReport,

    /// Driver problems encountered on the way.
    pub warnings: Vec<String>,
}

/// Counters carried through the state machine.
struct Run<'o> {
    options: &'o Options,
    settle: Duration,
    iterations: usize,
    unchanged: usize,
    last_height: u64,
    expansion: Expansion,
}

impl Run<'_> {
    fn budget_left(&self) -> bool {
        self.iterations < self.options.max_scroll_iterations
    }

    /// One iteration is held back for a final expansion round.
    fn scroll_budget_left(&self) -> bool {
        self.iterations + 1 < self.options.max_scroll_iterations
    }

    fn driver_failed(&mut self, action: &str, err: &crate::Error) -> ExpansionState {
        warn!(action, error = %err, "page driver failed, ending expansion");
        self.expansion.warnings.push(format!("{action} failed: {err}"));
        ExpansionState::Done
    }
}

/// Reveal lazily loaded content.
///
/// Always terminates within `options.max_scroll_iterations` iterations.
pub async fn expand<P: Page + ?Sized>(page: &mut P, options: &Options) -> Expansion {
    let mut run = Run {
        options,
        settle: Duration::from_millis(options.settle_delay_ms),
        iterations: 0,
        unchanged: 0,
        last_height: 0,
        expansion: Expansion::default(),
    };
    run.expansion.report.enabled = true;

    let mut state = ExpansionState::Idle;
    let mut pending: Vec<ControlHandle> = Vec::new();

    loop {
        debug!(?state, iterations = run.iterations, "expander step");
        state = match state {
            ExpansionState::Idle => match page.scroll_height().await {
                Ok(height) => {
                    run.last_height = height;
                    ExpansionState::Scrolling
                }
                Err(err) => run.driver_failed("measure height", &err),
            },

            ExpansionState::Scrolling => {
                if run.scroll_budget_left() {
                    scroll_step(page, &mut run).await
                } else {
                    run.expansion.report.hit_iteration_cap = true;
                    if run.budget_left() {
                        debug!(iterations = run.iterations, "scroll cap reached");
                        ExpansionState::Stable
                    } else {
                        ExpansionState::Done
                    }
                }
            }

            ExpansionState::Stable => match page.html().await {
                Ok(html) => {
                    pending = expansion_controls(&html, options);
                    if pending.is_empty() {
                        ExpansionState::Done
                    } else {
                        ExpansionState::Expanding
                    }
                }
                Err(err) => run.driver_failed("snapshot", &err),
            },

            // Stable is only entered with budget left.
            ExpansionState::Expanding => activate_all(page, &mut run, &pending).await,

            ExpansionState::Done => break,
        };
    }

    run.expansion.report.iterations = run.iterations;
    run.expansion.report.final_state = ExpansionState::Done;
    run.expansion
}

/// One scroll, one settle, one height check.
async fn scroll_step<P: Page + ?Sized>(page: &mut P, run: &mut Run<'_>) -> ExpansionState {
    run.iterations += 1;

    if let Err(err) = page.scroll_by(run.options.scroll_step_px).await {
        return run.driver_failed("scroll", &err);
    }
    page.settle(run.settle).await;

    let height = match page.scroll_height().await {
        Ok(height) => height,
        Err(err) => return run.driver_failed("measure height", &err),
    };

    if height == run.last_height {
        run.unchanged += 1;
    } else {
        run.unchanged = 0;
        run.last_height = height;
    }

    if run.unchanged >= run.options.stable_checks {
        debug!(height, iterations = run.iterations, "document height stable");
        ExpansionState::Stable
    } else {
        ExpansionState::Scrolling
    }
}

/// Click every pending control, then go back to scrolling.
///
/// If nothing could be clicked there is nothing new to wait for.
async fn activate_all<P: Page + ?Sized>(
    page: &mut P,
    run: &mut Run<'_>,
    controls: &[ControlHandle],
) -> ExpansionState {
    run.iterations += 1;
    let mut activated = 0;

    for control in controls {
        match page.activate(control).await {
            Ok(()) => {
                debug!(label = %control.label, index = control.index, "activated control");
                activated += 1;
            }
            Err(err) => {
                warn!(label = %control.label, error = %err, "control activation failed");
                run.expansion
                    .warnings
                    .push(format!("activate {:?} failed: {err}", control.text));
            }
        }
    }

    if activated == 0 {
        return ExpansionState::Done;
    }

    run.expansion.report.controls_activated += activated;
    page.settle(run.settle).await;
    run.unchanged = 0;
    ExpansionState::Scrolling
}

/// First matching control per configured label, each control at most once.
///
/// Handles are positional, so they come back last-first: a click that adds
/// or removes controls only shifts the ones after it, which are done.
fn expansion_controls(html: &str, options: &Options) -> Vec<ControlHandle> {
    let doc = dom::parse(html);
    let mut seen = HashSet::new();

    let mut controls: Vec<ControlHandle> = options
        .expansion_labels
        .iter()
        .filter_map(|label| {
            locator::find_controls_by_label(&doc, &options.control_selector, label)
                .into_iter()
                .next()
        })
        .filter(|control| seen.insert(control.index))
        .collect();
    controls.sort_by(|a, b| b.index.cmp(&a.index));
    controls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::page::StaticPage;
    use async_trait::async_trait;

    /// Buttons resolved by position in the current DOM, like a real driver.
    ///
    /// "Load more comments" stays and adds a `Like` button right after
    /// itself; "Show more comments" disappears once clicked.
    struct ShiftingPage {
        buttons: Vec<String>,
        clicked: Vec<String>,
    }

    #[async_trait]
    impl Page for ShiftingPage {
        async fn html(&self) -> Result<String> {
            Ok(self.buttons.iter().map(|b| format!("<button>{b}</button>")).collect())
        }
        async fn url(&self) -> Result<String> {
            Ok(String::new())
        }
        async fn scroll_height(&self) -> Result<u64> {
            Ok(1000)
        }
        async fn scroll_by(&mut self, _dy: u32) -> Result<()> {
            Ok(())
        }
        async fn activate(&mut self, control: &ControlHandle) -> Result<()> {
            let text = self.buttons[control.index].clone();
            match text.as_str() {
                "Load more comments" => self.buttons.insert(control.index + 1, "Like".to_string()),
                "Show more comments" => {
                    self.buttons.remove(control.index);
                }
                _ => {}
            }
            self.clicked.push(text);
            Ok(())
        }
        async fn settle(&mut self, _delay: Duration) {}
    }

    #[tokio::test]
    async fn test_static_page_settles_after_stable_checks() {
        let mut page = StaticPage::new("<div>no buttons</div>", "");
        let expansion = expand(&mut page, &Options::default()).await;

        assert!(expansion.report.enabled);
        assert_eq!(expansion.report.iterations, 3);
        assert_eq!(expansion.report.controls_activated, 0);
        assert!(!expansion.report.hit_iteration_cap);
        assert_eq!(expansion.report.final_state, ExpansionState::Done);
        assert!(expansion.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_stable_checks_is_tunable() {
        let mut page = StaticPage::new("<div></div>", "");
        let options = Options { stable_checks: 5, ..Options::default() };

        let expansion = expand(&mut page, &options).await;
        assert_eq!(expansion.report.iterations, 5);
    }

    #[tokio::test]
    async fn test_persistent_control_is_bounded_by_cap() {
        let mut page = StaticPage::new("<button>Load more comments</button>", "");
        let options = Options { max_scroll_iterations: 7, ..Options::default() };

        let expansion = expand(&mut page, &options).await;

        // 3 scrolls, click, 2 scrolls, final click
        assert_eq!(expansion.report.iterations, 7);
        assert_eq!(expansion.report.controls_activated, 2);
        assert!(expansion.report.hit_iteration_cap);
        assert_eq!(expansion.report.final_state, ExpansionState::Done);
    }

    #[tokio::test]
    async fn test_single_iteration_budget_still_expands() {
        let mut page = StaticPage::new("<button>Show more comments</button>", "");
        let options = Options { max_scroll_iterations: 1, ..Options::default() };

        let expansion = expand(&mut page, &options).await;

        assert_eq!(expansion.report.iterations, 1);
        assert_eq!(expansion.report.controls_activated, 1);
        assert!(expansion.report.hit_iteration_cap);
    }

    #[tokio::test]
    async fn test_click_that_inserts_controls_does_not_misdirect_later_clicks() {
        let mut page = ShiftingPage {
            buttons: vec!["Load more comments".to_string(), "Show more comments".to_string()],
            clicked: Vec::new(),
        };
        let options = Options { max_scroll_iterations: 5, ..Options::default() };

        let expansion = expand(&mut page, &options).await;

        assert_eq!(page.clicked[..2], ["Show more comments", "Load more comments"]);
        assert!(!page.clicked.iter().any(|text| text == "Like"));
        assert!(expansion.report.iterations <= 5);
    }

    #[test]
    fn test_expansion_controls_one_per_label() {
        let html = r#"
            <button>Load more comments</button>
            <button>Load more comments</button>
            <button>Show more comments</button>
        "#;

        let controls = expansion_controls(html, &Options::default());
        let indexes: Vec<_> = controls.iter().map(|c| c.index).collect();
        assert_eq!(indexes, vec![2, 0]);
    }

    #[test]
    fn test_expansion_controls_same_control_once() {
        let html = "<button>Load more comments / show more comments</button>";

        let controls = expansion_controls(html, &Options::default());
        assert_eq!(controls.len(), 1);
    }
}
