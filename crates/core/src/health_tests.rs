// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    healthy = { "Healthy", HealthStatus::Healthy },
    progressing = { "Progressing", HealthStatus::Progressing },
    degraded = { "Degraded", HealthStatus::Degraded },
    suspended = { "Suspended", HealthStatus::Suspended },
    missing = { "Missing", HealthStatus::Missing },
    garbage = { "whatever", HealthStatus::Unknown },
)]
fn parse_health(input: &str, expected: HealthStatus) {
    assert_eq!(HealthStatus::parse(input), expected);
}

#[test]
fn health_round_trips_through_display() {
    for h in [
        HealthStatus::Healthy,
        HealthStatus::Progressing,
        HealthStatus::Degraded,
        HealthStatus::Suspended,
        HealthStatus::Missing,
        HealthStatus::Unknown,
    ] {
        assert_eq!(HealthStatus::parse(&h.to_string()), h);
    }
}

#[parameterized(
    synced = { "Synced", SyncStatus::Synced },
    out_of_sync = { "OutOfSync", SyncStatus::OutOfSync },
    other = { "", SyncStatus::Unknown },
)]
fn parse_sync(input: &str, expected: SyncStatus) {
    assert_eq!(SyncStatus::parse(input), expected);
}

#[parameterized(
    healthy = { HealthStatus::Healthy, false },
    degraded = { HealthStatus::Degraded, true },
    progressing = { HealthStatus::Progressing, true },
    missing = { HealthStatus::Missing, false },
)]
fn unhealthy_resources(health: HealthStatus, unhealthy: bool) {
    let resource = ResourceStatus {
        health,
        ..ResourceStatus::default()
    };
    assert_eq!(resource.is_unhealthy(), unhealthy);
}
