/// Returns `true` for any 2xx status.
pub fn is_success(status: u16) -> bool { (200..300).contains(&status) }

/// Returns `true` if a response to a range request starting at wire byte
/// `first` can be appended to a segment file.
///
/// `206 Partial Content` is always accepted. A plain `200 OK` means the
/// server ignored the `Range` header and sent the resource from its first
/// byte, which is only usable when that is where the range starts.
///
/// # Examples
///
/// ```
/// use strata_fetch::accepts_range_status;
///
/// assert!(accepts_range_status(206, 4096));
/// assert!(accepts_range_status(200, 0));
/// assert!(!accepts_range_status(200, 4096));
/// assert!(!accepts_range_status(416, 0));
/// ```
pub fn accepts_range_status(status: u16, first: u64) -> bool {
    match status {
        206 => true,
        200 => first == 0,
        _ => false,
    }
}
