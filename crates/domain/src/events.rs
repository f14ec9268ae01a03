/// Notification delivered to the registered observer around a commit batch.
///
/// `BeforeUpdate` means filter files are about to be replaced; consumers must
/// stop reading them before returning from the callback. `AfterUpdate` means
/// the new files are in place and matchers can be rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateEvent {
    BeforeUpdate,
    AfterUpdate,
}
