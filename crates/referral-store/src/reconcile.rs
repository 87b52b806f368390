//! The reconciliation engine: [`reconcile`] is a pure, total, deterministic
//! function from an unordered multiset of events to a [`ReconciledMap`].
//!
//! Per referral, independently: group, deduplicate by `seq` (first occurrence
//! wins), sort ascending, count gaps, then replay in `seq` order applying the
//! status-transition and appointment-tracking rules below. No step can fail —
//! an event whose payload doesn't decode for its type (see
//! `referral_core::events`) is simply skipped during replay; it still counts
//! toward deduplication and gap accounting, since those depend only on
//! `(referral_id, seq)`.

use std::collections::BTreeMap;

use referral_core::{ApptId, Event, ReferralId, Status};

use crate::types::{Appointment, AppointmentSlot, ReconciledMap, ReferralMetrics, ReferralState};

/// Reconcile a batch of events into the current state of every referral they
/// mention. Order-independent and duplicate-idempotent for the retained
/// state; see the module docs for the one documented exception (which
/// duplicate payload is retained when duplicates disagree).
#[must_use]
pub fn reconcile(events: &[Event]) -> ReconciledMap {
    let mut groups: BTreeMap<ReferralId, Vec<&Event>> = BTreeMap::new();
    for event in events {
        groups.entry(event.referral_id.clone()).or_default().push(event);
    }

    groups
        .into_iter()
        .map(|(referral_id, raw)| {
            let state = reconcile_referral(referral_id.clone(), raw);
            (referral_id, state)
        })
        .collect()
}

fn reconcile_referral(referral_id: ReferralId, raw_events: Vec<&Event>) -> ReferralState {
    let (retained, duplicates) = dedupe_by_seq(raw_events);
    let mut retained = retained;
    retained.sort_by_key(|e| e.seq);

    let seq_gaps = count_gaps(&retained);

    let mut status = Status::Created;
    let mut is_terminal = false;
    let mut appointments: BTreeMap<ApptId, AppointmentSlot> = BTreeMap::new();
    let mut terminal_overrides = 0u32;
    let mut reschedules = 0u32;
    let mut cancelled_appts = 0u32;

    for event in &retained {
        match event.event_type {
            referral_core::EventType::StatusUpdate => {
                if let Some(new_status) = event.status_payload() {
                    apply_status_update(
                        new_status,
                        &mut status,
                        &mut is_terminal,
                        &mut terminal_overrides,
                    );
                }
            }
            referral_core::EventType::AppointmentSet => {
                if let Some(payload) = event.appointment_set_payload() {
                    apply_appointment_set(payload, &mut appointments, &mut reschedules);
                }
            }
            referral_core::EventType::AppointmentCancelled => {
                if let Some(appt_id) = event.appt_id() {
                    apply_appointment_cancelled(appt_id, &mut appointments, &mut cancelled_appts);
                }
            }
        }
    }

    let active_appointment = if is_terminal {
        None
    } else {
        select_active(&appointments)
    };

    ReferralState {
        referral_id,
        status,
        active_appointment,
        appointments,
        events: retained.into_iter().cloned().collect(),
        metrics: ReferralMetrics {
            duplicates,
            seq_gaps,
            terminal_overrides,
            reschedules,
            cancelled_appts,
        },
    }
}

/// Deduplicate by `seq`, keeping the first occurrence encountered in the
/// given (pre-sort) order. Returns the retained events and how many were
/// dropped.
fn dedupe_by_seq(raw_events: Vec<&Event>) -> (Vec<&Event>, u32) {
    let mut seen = BTreeMap::new();
    let mut duplicates = 0u32;
    for event in raw_events {
        if seen.contains_key(&event.seq) {
            duplicates += 1;
        } else {
            let _ = seen.insert(event.seq, event);
        }
    }
    (seen.into_values().collect(), duplicates)
}

/// `Σ max(0, seq[i+1] - seq[i] - 1)` over consecutive retained pairs.
/// `retained` must already be sorted ascending by `seq`.
fn count_gaps(retained: &[&Event]) -> u32 {
    retained
        .windows(2)
        .map(|pair| (pair[1].seq - pair[0].seq - 1).max(0) as u32)
        .sum()
}

fn apply_status_update(
    new_status: Status,
    status: &mut Status,
    is_terminal: &mut bool,
    terminal_overrides: &mut u32,
) {
    if *is_terminal {
        if new_status.is_terminal() {
            *status = new_status;
            *terminal_overrides += 1;
        }
        // terminal -> non-terminal: ignored.
    } else {
        *status = new_status;
        if new_status.is_terminal() {
            *is_terminal = true;
        }
    }
}

fn apply_appointment_set(
    payload: referral_core::events::AppointmentPayload,
    appointments: &mut BTreeMap<ApptId, AppointmentSlot>,
    reschedules: &mut u32,
) {
    if let Some(existing) = appointments.get(&payload.appt_id) {
        if existing.appointment().start_time != payload.start_time {
            *reschedules += 1;
        }
    }
    let _ = appointments.insert(
        payload.appt_id.clone(),
        AppointmentSlot::Present(Appointment {
            appt_id: payload.appt_id,
            start_time: payload.start_time,
        }),
    );
}

fn apply_appointment_cancelled(
    appt_id: ApptId,
    appointments: &mut BTreeMap<ApptId, AppointmentSlot>,
    cancelled_appts: &mut u32,
) {
    if let Some(AppointmentSlot::Present(appt)) = appointments.get(&appt_id) {
        let appt = appt.clone();
        let _ = appointments.insert(appt_id, AppointmentSlot::Cancelled(appt));
        *cancelled_appts += 1;
    }
    // absent or already cancelled: ignored.
}

/// The earliest non-cancelled appointment, tiebroken by ascending `appt_id`.
fn select_active(appointments: &BTreeMap<ApptId, AppointmentSlot>) -> Option<Appointment> {
    appointments
        .values()
        .filter(|slot| !slot.is_cancelled())
        .map(AppointmentSlot::appointment)
        .min_by(|a, b| (a.start_time, &a.appt_id).cmp(&(b.start_time, &b.appt_id)))
        .cloned()
}
