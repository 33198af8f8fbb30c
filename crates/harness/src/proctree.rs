//! Process tree discovery for teardown

use std::collections::{HashMap, VecDeque};
use std::process::Command;

use crate::error::{HarnessError, HarnessResult};

/// A process below the supervised root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descendant {
    pub pid: u32,
    pub depth: usize,
}

/// Parse `ps -o pid=,ppid=` output into a parent -> children map
pub fn parse_ps_table(output: &str) -> HashMap<u32, Vec<u32>> {
    let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
    for line in output.lines() {
        let mut fields = line.split_whitespace();
        let (Some(pid), Some(ppid)) = (fields.next(), fields.next()) else {
            continue;
        };
        let (Ok(pid), Ok(ppid)) = (pid.parse::<u32>(), ppid.parse::<u32>()) else {
            continue;
        };
        children.entry(ppid).or_default().push(pid);
    }
    for pids in children.values_mut() {
        pids.sort_unstable();
    }
    children
}

/// All transitive children of `root`, in termination order.
///
/// Deeper processes come first; within a level, higher pids (spawned later)
/// come first.
pub fn termination_order(table: &HashMap<u32, Vec<u32>>, root: u32) -> Vec<Descendant> {
    let mut found = Vec::new();
    let mut queue = VecDeque::from([(root, 0usize)]);

    while let Some((pid, depth)) = queue.pop_front() {
        if let Some(children) = table.get(&pid) {
            for &child in children {
                // pid reuse can make a table cyclic
                if child == root || found.iter().any(|d: &Descendant| d.pid == child) {
                    continue;
                }
                found.push(Descendant { pid: child, depth: depth + 1 });
                queue.push_back((child, depth + 1));
            }
        }
    }

    found.sort_by(|a, b| b.depth.cmp(&a.depth).then(b.pid.cmp(&a.pid)));
    found
}

/// Snapshot the current process table and return the descendants of `root`
pub fn descendants(root: u32) -> HarnessResult<Vec<Descendant>> {
    let output = Command::new("ps")
        .args(["-A", "-o", "pid=", "-o", "ppid="])
        .output()?;
    if !output.status.success() {
        return Err(HarnessError::Spawn(format!(
            "ps exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    let table = parse_ps_table(&String::from_utf8_lossy(&output.stdout));
    Ok(termination_order(&table, root))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "
        1     0
      100     1
      101   100
      102   100
      205   101
      300     1
      garbage line
";

    #[test]
    fn test_parse_ps_table() {
        let table = parse_ps_table(TABLE);
        assert_eq!(table.get(&100), Some(&vec![101, 102]));
        assert_eq!(table.get(&101), Some(&vec![205]));
        assert_eq!(table.get(&1), Some(&vec![100, 300]));
    }

    #[test]
    fn test_termination_order_deepest_newest_first() {
        let table = parse_ps_table(TABLE);
        let order: Vec<u32> = termination_order(&table, 100).iter().map(|d| d.pid).collect();
        assert_eq!(order, vec![205, 102, 101]);
    }

    #[test]
    fn test_leaf_has_no_descendants() {
        let table = parse_ps_table(TABLE);
        assert!(termination_order(&table, 300).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_live_process_has_no_children() {
        let mut child = Command::new("sleep").arg("5").spawn().unwrap();
        let found = descendants(child.id()).unwrap();
        assert!(found.is_empty());
        child.kill().unwrap();
        child.wait().unwrap();
    }
}
