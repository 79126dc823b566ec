use crate::engine::scene::entity::ScreenPoint;
use crate::error::WorkspaceError;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Move(ScreenPoint),
    /// Left click.
    Primary(ScreenPoint),
    /// Right click, the finalize action.
    Secondary(ScreenPoint),
}

impl PointerEvent {
    pub fn position(&self) -> ScreenPoint {
        match self {
            Self::Move(p) | Self::Primary(p) | Self::Secondary(p) => *p,
        }
    }
}

/// Pointer events waiting for the next tick.
///
/// Clicks are kept in order and delivered once each. A move only survives until something
/// newer arrives: a later move replaces it and a click drops it, so no stale position is
/// ever replayed after a click.
#[derive(Debug, Default)]
pub struct PointerQueue {
    events: VecDeque<PointerEvent>,
}

impl PointerQueue {
    pub fn push(&mut self, event: PointerEvent) {
        if let Some(PointerEvent::Move(_)) = self.events.back() {
            self.events.pop_back();
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = PointerEvent> + '_ {
        self.events.drain(..)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// The consumers that may hold pointer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerConsumer {
    Picking,
    Measure,
    Draw,
}

/// Grants pointer input to one consumer at a time.
#[derive(Debug, Default)]
pub struct PointerRouter {
    active: Option<PointerConsumer>,
}

impl PointerRouter {
    /// Fails while another registration is live; the holder must release first.
    pub fn subscribe(&mut self, consumer: PointerConsumer) -> Result<(), WorkspaceError> {
        match self.active {
            Some(active) => Err(WorkspaceError::PointerSubscriptionConflict {
                active,
                requested: consumer,
            }),
            None => {
                self.active = Some(consumer);
                Ok(())
            }
        }
    }

    pub fn release(&mut self, consumer: PointerConsumer) {
        if self.active == Some(consumer) {
            self.active = None;
        }
    }

    pub fn active(&self) -> Option<PointerConsumer> {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32) -> ScreenPoint {
        ScreenPoint::new(x, y)
    }

    #[test]
    fn later_moves_replace_earlier_ones() {
        let mut queue = PointerQueue::default();
        queue.push(PointerEvent::Move(p(1.0, 1.0)));
        queue.push(PointerEvent::Move(p(2.0, 2.0)));
        queue.push(PointerEvent::Move(p(3.0, 3.0)));

        let events: Vec<_> = queue.drain().collect();
        assert_eq!(events, vec![PointerEvent::Move(p(3.0, 3.0))]);
    }

    #[test]
    fn clicks_keep_order_and_drop_pending_move() {
        let mut queue = PointerQueue::default();
        queue.push(PointerEvent::Primary(p(0.0, 0.0)));
        queue.push(PointerEvent::Move(p(5.0, 5.0)));
        queue.push(PointerEvent::Primary(p(10.0, 0.0)));
        queue.push(PointerEvent::Move(p(6.0, 6.0)));
        queue.push(PointerEvent::Secondary(p(7.0, 7.0)));
        queue.push(PointerEvent::Move(p(8.0, 8.0)));

        let events: Vec<_> = queue.drain().collect();
        assert_eq!(
            events,
            vec![
                PointerEvent::Primary(p(0.0, 0.0)),
                PointerEvent::Primary(p(10.0, 0.0)),
                PointerEvent::Secondary(p(7.0, 7.0)),
                PointerEvent::Move(p(8.0, 8.0)),
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn router_grants_one_consumer_at_a_time() {
        let mut router = PointerRouter::default();
        router.subscribe(PointerConsumer::Picking).unwrap();

        let err = router.subscribe(PointerConsumer::Draw).unwrap_err();
        assert_eq!(
            err,
            WorkspaceError::PointerSubscriptionConflict {
                active: PointerConsumer::Picking,
                requested: PointerConsumer::Draw,
            }
        );

        // Releasing on behalf of someone else changes nothing.
        router.release(PointerConsumer::Measure);
        assert_eq!(router.active(), Some(PointerConsumer::Picking));

        router.release(PointerConsumer::Picking);
        router.subscribe(PointerConsumer::Draw).unwrap();
        assert_eq!(router.active(), Some(PointerConsumer::Draw));
    }
}
