// Readiness Port - backend-to-orchestrator "initialization finished" signal

/// Receives the backend's single readiness notification.
///
/// Implementations must tolerate repeated calls; only the first one has an
/// effect.
pub trait ReadinessObserver: Send + Sync {
    fn on_ready(&self);
}
