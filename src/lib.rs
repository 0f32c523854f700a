/*!
pingmon - endpoint liveness and latency prober.

One invocation probes one configured target (TCP connect or HTTP request,
N sequential attempts), appends the resulting ping record to that target's
JSON history file and prunes entries older than the retention window.
Scheduling is external; pingmon never runs its own timer loop.
*/

pub mod cli;
pub mod config;
pub mod core;
