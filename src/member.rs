use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub type MemberId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
}

impl NewMember {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            role: role.into(),
        }
    }

    pub(crate) fn into_member(self, id: MemberId) -> GroupMember {
        GroupMember {
            id,
            name: self.name,
            email: self.email,
            role: self.role,
            performance: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    pub id: MemberId,
    pub name: String,
    pub email: String,
    pub role: String,
    /// Latest score per metric name.
    #[serde(default)]
    pub performance: BTreeMap<String, f64>,
}

impl GroupMember {
    pub fn record_performance(&mut self, metric: impl Into<String>, score: f64) {
        self.performance.insert(metric.into(), score);
    }

    pub fn average_performance(&self) -> f64 {
        if self.performance.is_empty() {
            return 0.0;
        }
        self.performance.values().sum::<f64>() / self.performance.len() as f64
    }
}

impl fmt::Display for GroupMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.role)
    }
}

/// Tree of member ids. Sub-groups are only ever appended, so the tree has no cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeGroup {
    pub name: String,
    #[serde(default)]
    members: Vec<MemberId>,
    #[serde(default)]
    sub_groups: Vec<CompositeGroup>,
    #[serde(default)]
    leader: Option<MemberId>,
}

impl CompositeGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            sub_groups: Vec::new(),
            leader: None,
        }
    }

    pub fn add_member(&mut self, member: MemberId) {
        self.members.push(member);
        if self.leader.is_none() {
            self.leader = Some(member);
        }
    }

    pub fn add_sub_group(&mut self, group: CompositeGroup) {
        self.sub_groups.push(group);
    }

    pub fn set_leader(&mut self, member: MemberId) {
        self.leader = Some(member);
    }

    pub fn leader(&self) -> Option<MemberId> {
        self.leader
    }

    pub fn members(&self) -> &[MemberId] {
        &self.members
    }

    pub fn sub_groups(&self) -> &[CompositeGroup] {
        &self.sub_groups
    }

    /// Direct members first, then every sub-group depth-first.
    pub fn all_members(&self) -> Vec<MemberId> {
        let mut all = self.members.clone();
        for group in &self.sub_groups {
            all.extend(group.all_members());
        }
        all
    }

    pub fn total_size(&self) -> usize {
        self.members.len()
            + self
                .sub_groups
                .iter()
                .map(CompositeGroup::total_size)
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_performance_is_zero_without_scores() {
        let mut member = NewMember::new("Alice", "alice@example.com", "Leader").into_member(1);
        assert_eq!(member.average_performance(), 0.0);
        member.record_performance("quiz", 80.0);
        member.record_performance("lab", 90.0);
        member.record_performance("quiz", 70.0);
        assert_eq!(member.average_performance(), 80.0);
    }

    #[test]
    fn leader_defaults_to_first_member() {
        let mut group = CompositeGroup::new("Main");
        group.add_member(3);
        group.add_member(4);
        assert_eq!(group.leader(), Some(3));
        group.set_leader(4);
        assert_eq!(group.leader(), Some(4));
    }

    #[test]
    fn nested_groups_flatten_depth_first() {
        let mut inner = CompositeGroup::new("Inner");
        inner.add_member(5);
        let mut middle = CompositeGroup::new("Middle");
        middle.add_member(3);
        middle.add_sub_group(inner);
        middle.add_member(4);

        let mut root = CompositeGroup::new("Root");
        root.add_member(1);
        root.add_sub_group(middle);
        root.add_member(2);

        assert_eq!(root.all_members(), vec![1, 2, 3, 4, 5]);
        assert_eq!(root.total_size(), 5);
    }
}
