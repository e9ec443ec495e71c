use std::rc::Rc;
use std::sync::Arc;

/// One-way channel from the dialog page to the native host. The host gets the
/// event name and the requesting uid; nothing flows back.
pub trait NativeBridge {
    fn call_native_handler(&self, event: &str, uid: &str);
}

impl<T: NativeBridge + ?Sized> NativeBridge for &T {
    fn call_native_handler(&self, event: &str, uid: &str) {
        (**self).call_native_handler(event, uid)
    }
}

impl<T: NativeBridge + ?Sized> NativeBridge for Box<T> {
    fn call_native_handler(&self, event: &str, uid: &str) {
        (**self).call_native_handler(event, uid)
    }
}

impl<T: NativeBridge + ?Sized> NativeBridge for Rc<T> {
    fn call_native_handler(&self, event: &str, uid: &str) {
        (**self).call_native_handler(event, uid)
    }
}

impl<T: NativeBridge + ?Sized> NativeBridge for Arc<T> {
    fn call_native_handler(&self, event: &str, uid: &str) {
        (**self).call_native_handler(event, uid)
    }
}
