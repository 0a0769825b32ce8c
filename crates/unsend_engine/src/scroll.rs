use engine_logging::{engine_debug, engine_info};

use crate::dom::{Document, DomError, ScrollAlign, ScrollBehavior};
use crate::query;

/// Offsets within this distance are considered unchanged.
const EPSILON: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealStrategy {
    SmoothScroll,
    DirectOffset,
    BringIntoView,
    Ancestor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealReport<N> {
    /// Region that actually moved, or the input region if nothing did.
    pub region: N,
    pub moved_by: Option<RevealStrategy>,
}

/// Moves toward older content, escalating until some offset decreases.
///
/// Never leaves a region scrolled further down than it was. `topmost` is the
/// earliest rendered message, used to coax virtualized lists into loading.
pub fn reveal_older_content<D: Document>(
    doc: &D,
    region: D::Node,
    step: f64,
    topmost: Option<D::Node>,
) -> Result<RevealReport<D::Node>, DomError> {
    if let Some(strategy) = nudge_up(doc, region, step)? {
        return Ok(RevealReport {
            region,
            moved_by: Some(strategy),
        });
    }

    if let Some(node) = topmost.filter(|n| doc.is_connected(*n)) {
        let before = Offset::read(doc, region);
        doc.scroll_into_view(node, ScrollAlign::Start)?;
        if moved_up(doc, region, before)? {
            return Ok(RevealReport {
                region,
                moved_by: Some(RevealStrategy::BringIntoView),
            });
        }
    }

    for ancestor in query::scrollable_ancestors(doc, region) {
        if nudge_up(doc, ancestor, step)?.is_some() {
            engine_info!("scroll region stopped responding; escalated to ancestor {:?}", ancestor);
            return Ok(RevealReport {
                region: ancestor,
                moved_by: Some(RevealStrategy::Ancestor),
            });
        }
    }

    engine_debug!("no scroll strategy moved region {:?}", region);
    Ok(RevealReport {
        region,
        moved_by: None,
    })
}

fn nudge_up<D: Document>(
    doc: &D,
    region: D::Node,
    step: f64,
) -> Result<Option<RevealStrategy>, DomError> {
    let before = Offset::read(doc, region);
    doc.scroll_by(region, -step, ScrollBehavior::Smooth)?;
    doc.dispatch_wheel(region, -step)?;
    if moved_up(doc, region, before)? {
        return Ok(Some(RevealStrategy::SmoothScroll));
    }

    let before = Offset::read(doc, region);
    doc.set_scroll_top(region, (before.top - step).max(0.0))?;
    if moved_up(doc, region, before)? {
        return Ok(Some(RevealStrategy::DirectOffset));
    }
    Ok(None)
}

/// Scroll position measured from the end of the content, so that history
/// prepended above the viewport (and any anchoring the host applies) does not
/// read as downward movement.
#[derive(Debug, Clone, Copy)]
struct Offset {
    top: f64,
    from_end: f64,
}

impl Offset {
    fn read<D: Document>(doc: &D, region: D::Node) -> Self {
        let top = doc.scroll_top(region);
        Self {
            top,
            from_end: doc.scroll_height(region) - top,
        }
    }
}

/// Whether the region moved toward older content; downward movement is rolled back.
fn moved_up<D: Document>(doc: &D, region: D::Node, before: Offset) -> Result<bool, DomError> {
    let after = Offset::read(doc, region);
    if after.from_end < before.from_end - EPSILON {
        doc.set_scroll_top(region, before.top)?;
        return Ok(false);
    }
    Ok(after.from_end > before.from_end + EPSILON)
}
