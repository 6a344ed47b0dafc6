// Copyright 2026 the Pacer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-flight frame records.
//!
//! A [`SlotRing`] holds `N` [`FrameSlot`]s. Frame `id` lives in slot
//! `id mod N`, so at most `N` frames can be in flight at once. Each slot runs
//! the cyclic state machine below; every other transition is a caller bug
//! and panics.
//!
//! ```text
//! Ready     --predict-->            Predicted
//! Predicted --mark_point(WakeUp)--> WaitLeft
//! WaitLeft  --mark_point(Begin)-->  Begun
//! WaitLeft  --mark_discarded-->     Ready
//! Begun     --mark_discarded-->     Ready
//! Begun     --mark_delivered-->     Ready
//! ```

use core::fmt;

use crate::time::{Duration, HostTime};
use crate::timing::FrameTimestamps;

/// Default number of frames that may be in flight at once.
pub const DEFAULT_FRAME_SLOTS: usize = 2;

/// Identifies one predicted frame. Ids start at 1 and only grow.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(pub i64);

impl FrameId {
    /// Raw value used in recordings for "no frame".
    pub const NONE: Self = Self(-1);

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Slot index for this id in a ring of `len` slots.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the remainder is below `len`, which is a usize"
    )]
    pub const fn slot_index(self, len: usize) -> usize {
        (self.0 as u64 % len as u64) as usize
    }
}

impl fmt::Debug for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameId({})", self.0)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a [`FrameSlot`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SlotState {
    /// Free for the next prediction.
    #[default]
    Ready,
    /// Predicted; the render loop has not woken up yet.
    Predicted,
    /// The render loop woke up and left its wait.
    WaitLeft,
    /// The render loop began work on the frame.
    Begun,
}

/// One in-flight frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameSlot {
    /// The frame occupying this slot, `None` when [`SlotState::Ready`].
    pub frame_id: Option<FrameId>,
    /// Current lifecycle state.
    pub state: SlotState,
    /// When the frame was predicted to be displayed.
    pub predicted_display_time: HostTime,
    /// The display period selected for the frame.
    pub predicted_display_period: Duration,
    /// When the application should have delivered the frame.
    pub predicted_delivery_time: HostTime,
    /// When each milestone happened.
    pub timestamps: FrameTimestamps,
}

impl FrameSlot {
    /// `Ready → Predicted`.
    pub(crate) fn predict(
        &mut self,
        frame_id: FrameId,
        display_time: HostTime,
        period: Duration,
        delivery_time: HostTime,
        now: HostTime,
    ) {
        assert!(
            self.frame_id.is_none() && self.state == SlotState::Ready,
            "cannot predict frame {frame_id}: slot still holds frame {:?} in state {:?}",
            self.frame_id,
            self.state,
        );
        *self = Self {
            frame_id: Some(frame_id),
            state: SlotState::Predicted,
            predicted_display_time: display_time,
            predicted_display_period: period,
            predicted_delivery_time: delivery_time,
            timestamps: FrameTimestamps {
                predicted: now,
                ..FrameTimestamps::default()
            },
        };
    }

    /// `Predicted → WaitLeft`.
    pub(crate) fn wake_up(&mut self, when: HostTime) {
        self.expect_state(&[SlotState::Predicted], "wake up");
        self.timestamps.wait_woke = when;
        self.state = SlotState::WaitLeft;
    }

    /// `WaitLeft → Begun`.
    pub(crate) fn begin(&mut self, now: HostTime) {
        self.expect_state(&[SlotState::WaitLeft], "begin");
        self.timestamps.begin = now;
        self.state = SlotState::Begun;
    }

    /// `Begun → Ready`. Returns the frame as it was before the reset.
    pub(crate) fn deliver(&mut self, now: HostTime) -> Self {
        self.expect_state(&[SlotState::Begun], "deliver");
        self.timestamps.delivered = now;
        self.release()
    }

    /// `WaitLeft | Begun → Ready`. Returns the frame as it was before the
    /// reset.
    pub(crate) fn discard(&mut self, now: HostTime) -> Self {
        self.expect_state(&[SlotState::WaitLeft, SlotState::Begun], "discard");
        self.timestamps.delivered = now;
        self.release()
    }

    fn release(&mut self) -> Self {
        let finished = *self;
        self.frame_id = None;
        self.state = SlotState::Ready;
        finished
    }

    fn expect_state(&self, allowed: &[SlotState], action: &str) {
        assert!(
            allowed.contains(&self.state),
            "cannot {action} frame {:?} in state {:?} (expected one of {allowed:?})",
            self.frame_id,
            self.state,
        );
    }
}

/// Fixed ring of `N` frame slots addressed by `frame_id mod N`.
#[derive(Clone, Debug)]
pub struct SlotRing<const N: usize = DEFAULT_FRAME_SLOTS> {
    slots: [FrameSlot; N],
}

impl<const N: usize> Default for SlotRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SlotRing<N> {
    /// Creates a ring with every slot [`SlotState::Ready`].
    ///
    /// # Panics
    ///
    /// Panics if `N` is zero.
    #[must_use]
    pub fn new() -> Self {
        assert!(N > 0, "a slot ring needs at least one slot");
        Self {
            slots: [FrameSlot::default(); N],
        }
    }

    /// Number of slots.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// The slot `frame_id` maps to, whatever it currently holds.
    #[must_use]
    pub fn slot_for(&self, frame_id: FrameId) -> &FrameSlot {
        &self.slots[frame_id.slot_index(N)]
    }

    /// The free slot a new frame will occupy.
    pub(crate) fn vacant_mut(&mut self, frame_id: FrameId) -> &mut FrameSlot {
        &mut self.slots[frame_id.slot_index(N)]
    }

    /// The slot holding `frame_id`.
    ///
    /// # Panics
    ///
    /// Panics if that slot holds a different frame or none at all.
    pub(crate) fn occupied_mut(&mut self, frame_id: FrameId) -> &mut FrameSlot {
        let slot = &mut self.slots[frame_id.slot_index(N)];
        assert_eq!(
            slot.frame_id,
            Some(frame_id),
            "frame {frame_id} is not in flight"
        );
        slot
    }

    /// Number of slots not in [`SlotState::Ready`].
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.state != SlotState::Ready)
            .count()
    }

    /// Iterates over all slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = &FrameSlot> {
        self.slots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predicted(ring: &mut SlotRing, id: i64) {
        ring.vacant_mut(FrameId(id)).predict(
            FrameId(id),
            HostTime(100),
            Duration(10),
            HostTime(90),
            HostTime(50),
        );
    }

    #[test]
    fn ids_map_modulo_capacity() {
        assert_eq!(FrameId(1).slot_index(2), 1);
        assert_eq!(FrameId(2).slot_index(2), 0);
        assert_eq!(FrameId(7).slot_index(3), 1);
    }

    #[test]
    fn new_ring_is_all_ready() {
        let ring = SlotRing::<3>::new();
        assert_eq!(ring.capacity(), 3);
        assert_eq!(ring.in_flight(), 0);
        assert!(ring.iter().all(|s| s.frame_id.is_none()));
    }

    #[test]
    fn full_cycle_returns_slot_to_ready() {
        let mut ring = SlotRing::<2>::new();
        predicted(&mut ring, 1);
        assert_eq!(ring.in_flight(), 1);

        let slot = ring.occupied_mut(FrameId(1));
        slot.wake_up(HostTime(60));
        slot.begin(HostTime(70));
        let done = slot.deliver(HostTime(85));

        assert_eq!(done.frame_id, Some(FrameId(1)));
        assert_eq!(done.state, SlotState::Begun);
        assert_eq!(
            done.timestamps,
            FrameTimestamps {
                predicted: HostTime(50),
                wait_woke: HostTime(60),
                begin: HostTime(70),
                delivered: HostTime(85),
            }
        );
        assert_eq!(ring.slot_for(FrameId(1)).state, SlotState::Ready);
        assert_eq!(ring.slot_for(FrameId(1)).frame_id, None);
        assert_eq!(ring.in_flight(), 0);
    }

    #[test]
    fn discard_is_allowed_after_wake_up() {
        let mut ring = SlotRing::<2>::new();
        predicted(&mut ring, 1);
        let slot = ring.occupied_mut(FrameId(1));
        slot.wake_up(HostTime(60));
        let done = slot.discard(HostTime(61));
        assert_eq!(done.timestamps.delivered, HostTime(61));
        assert_eq!(ring.in_flight(), 0);
    }

    #[test]
    #[should_panic(expected = "cannot predict frame 3")]
    fn predicting_into_occupied_slot_panics() {
        let mut ring = SlotRing::<2>::new();
        predicted(&mut ring, 1);
        predicted(&mut ring, 3);
    }

    #[test]
    #[should_panic(expected = "frame 2 is not in flight")]
    fn looking_up_unknown_frame_panics() {
        let mut ring = SlotRing::<2>::new();
        predicted(&mut ring, 1);
        let _ = ring.occupied_mut(FrameId(2));
    }

    #[test]
    #[should_panic(expected = "cannot deliver")]
    fn deliver_before_begin_panics() {
        let mut ring = SlotRing::<2>::new();
        predicted(&mut ring, 1);
        let slot = ring.occupied_mut(FrameId(1));
        slot.wake_up(HostTime(60));
        let _ = slot.deliver(HostTime(61));
    }

    #[test]
    #[should_panic(expected = "cannot discard")]
    fn discard_straight_after_predict_panics() {
        let mut ring = SlotRing::<2>::new();
        predicted(&mut ring, 1);
        let _ = ring.occupied_mut(FrameId(1)).discard(HostTime(61));
    }
}
