/// Returns the number of units (replicas or clients) the host at `host_index` runs
/// when `total_units` are spread over `num_hosts` hosts.
///
/// Units are spread as evenly as possible; the remainder goes to the lowest indexed
/// hosts. No hosts means nothing gets assigned.
#[must_use]
pub fn units_for_host(host_index: usize, total_units: u32, num_hosts: usize) -> u32 {
    if num_hosts == 0 || host_index >= num_hosts {
        return 0;
    }

    let num_hosts = u32::try_from(num_hosts).unwrap_or(u32::MAX);
    let units_per_host = total_units / num_hosts;
    let remaining_units = total_units % num_hosts;

    if host_index < remaining_units as usize {
        units_per_host + 1
    } else {
        units_per_host
    }
}
