use std::ffi::CStr;
use std::io;

/// Default interface used when nothing on the host matches the pattern.
pub const FALLBACK_INTERFACE: &str = "enx0c37965f8a16";
pub const DEFAULT_PATTERN: &str = "eth0";

/// Names of all network interfaces on this host, in kernel index order.
pub fn list_interfaces() -> io::Result<Vec<String>> {
    let head = unsafe { libc::if_nameindex() };
    if head.is_null() {
        return Err(io::Error::last_os_error());
    }

    let mut names = Vec::new();
    let mut cursor = head;
    unsafe {
        while (*cursor).if_index != 0 && !(*cursor).if_name.is_null() {
            names.push(CStr::from_ptr((*cursor).if_name).to_string_lossy().into_owned());
            cursor = cursor.add(1);
        }
        libc::if_freenameindex(head);
    }
    Ok(names)
}

/// Picks the interface a tool should bind to.
pub trait InterfaceSelector {
    fn select(&self, available: &[String]) -> Option<String>;
}

/// Always the named interface, whether or not it is listed.
#[derive(Debug, Clone)]
pub struct Explicit(pub String);

impl InterfaceSelector for Explicit {
    fn select(&self, _available: &[String]) -> Option<String> {
        Some(self.0.clone())
    }
}

/// First interface whose name contains `pattern`, else `fallback`.
#[derive(Debug, Clone)]
pub struct FirstMatching {
    pub pattern: String,
    pub fallback: Option<String>,
}

impl Default for FirstMatching {
    fn default() -> Self {
        FirstMatching {
            pattern: DEFAULT_PATTERN.to_string(),
            fallback: Some(FALLBACK_INTERFACE.to_string()),
        }
    }
}

impl InterfaceSelector for FirstMatching {
    fn select(&self, available: &[String]) -> Option<String> {
        available
            .iter()
            .find(|name| name.contains(&self.pattern))
            .cloned()
            .or_else(|| self.fallback.clone())
    }
}

/// Runs `selector` against the host's interface list.
pub fn pick_interface(selector: &dyn InterfaceSelector) -> io::Result<Option<String>> {
    let available = list_interfaces()?;
    Ok(selector.select(&available))
}
