use crate::{DiscoveryEffect, DiscoveryEnd, DiscoveryMsg, DiscoveryPhase, DiscoveryState};

/// Pure update function: applies a message to the discovery state and returns the effects
/// the driver must perform next. Messages that do not fit the current phase are ignored.
pub fn update(
    mut state: DiscoveryState,
    msg: DiscoveryMsg,
) -> (DiscoveryState, Vec<DiscoveryEffect>) {
    let effects = match msg {
        DiscoveryMsg::Started { preloaded } => {
            if state.phase() != DiscoveryPhase::Idle {
                return (state, Vec::new());
            }
            state.begin(preloaded);
            vec![DiscoveryEffect::RequestPage { offset: 0 }]
        }
        DiscoveryMsg::PageLoaded { candidates } => match state.phase() {
            DiscoveryPhase::Requesting { offset } => {
                if candidates.is_empty() {
                    // An empty page is the upstream's end-of-results signal.
                    finish(&mut state, DiscoveryEnd::Exhausted)
                } else {
                    let fresh = state.absorb_page(candidates);
                    if fresh.is_empty() {
                        advance_or_finish(&mut state, offset)
                    } else {
                        state.set_phase(DiscoveryPhase::Deduplicating { offset });
                        vec![DiscoveryEffect::Checkpoint { urls: fresh }]
                    }
                }
            }
            _ => Vec::new(),
        },
        DiscoveryMsg::CheckpointWritten => match state.phase() {
            DiscoveryPhase::Deduplicating { offset } => advance_or_finish(&mut state, offset),
            _ => Vec::new(),
        },
        DiscoveryMsg::PageFailed { reason } => match state.phase() {
            DiscoveryPhase::Requesting { .. } => {
                finish(&mut state, DiscoveryEnd::Aborted { reason })
            }
            _ => Vec::new(),
        },
        DiscoveryMsg::CheckpointFailed { reason } => match state.phase() {
            DiscoveryPhase::Deduplicating { .. } => {
                finish(&mut state, DiscoveryEnd::Aborted { reason })
            }
            _ => Vec::new(),
        },
        DiscoveryMsg::Interrupted => {
            if state.is_finished() {
                Vec::new()
            } else {
                finish(&mut state, DiscoveryEnd::Interrupted)
            }
        }
    };

    (state, effects)
}

fn advance_or_finish(state: &mut DiscoveryState, offset: u64) -> Vec<DiscoveryEffect> {
    if state.stale_limit_reached(offset) {
        return finish(state, DiscoveryEnd::Exhausted);
    }
    let next = offset + state.config().page_size.max(1);
    state.set_phase(DiscoveryPhase::Requesting { offset: next });
    vec![
        DiscoveryEffect::Throttle,
        DiscoveryEffect::RequestPage { offset: next },
    ]
}

fn finish(state: &mut DiscoveryState, end: DiscoveryEnd) -> Vec<DiscoveryEffect> {
    state.finish(end.clone());
    vec![DiscoveryEffect::Finished(end)]
}
