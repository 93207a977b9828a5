//! Disjoint composites - groups whose children claim resources on their own.
//!
//! Each child is registered with the scheduler and wrapped in a
//! [`Proxy`], so a resource is held only while the child using it runs and
//! default tasks can fill the gaps. Proxying does not reach into nested
//! composites; use another disjoint constructor for those.

use crate::error::Result;
use crate::scheduler::Scheduler;
use interlock_compose::{ensure_disjoint, Deadline, ParallelAll, Proxy, RaceAny, Sequence};
use interlock_core::Task;
use tracing::debug;

impl Scheduler {
    /// Register `task` and return a requirement-free proxy for it.
    pub fn proxy(&mut self, task: impl Task + 'static) -> Result<Proxy> {
        let name = task.name().to_string();
        let id = self.add(task)?;
        debug!("Proxying task '{}' ({})", name, id);
        Ok(Proxy::new(id, &name))
    }

    /// Proxy every task in order.
    pub fn proxy_all(&mut self, tasks: Vec<Box<dyn Task>>) -> Result<Vec<Box<dyn Task>>> {
        tasks
            .into_iter()
            .map(|task| self.proxy(task).map(|p| Box::new(p) as Box<dyn Task>))
            .collect()
    }

    /// A sequence that holds each child's resources only while it runs.
    pub fn disjoint_sequence(&mut self, children: Vec<Box<dyn Task>>) -> Result<Sequence> {
        Ok(Sequence::new(self.proxy_all(children)?))
    }

    /// Parallel group of proxies. Children sharing a resource are rejected.
    pub fn disjoint_parallel_all(&mut self, children: Vec<Box<dyn Task>>) -> Result<ParallelAll> {
        ensure_disjoint(&children)?;
        Ok(ParallelAll::new(self.proxy_all(children)?)?)
    }

    /// Race of proxies. Children sharing a resource are rejected.
    pub fn disjoint_race_any(&mut self, children: Vec<Box<dyn Task>>) -> Result<RaceAny> {
        ensure_disjoint(&children)?;
        Ok(RaceAny::new(self.proxy_all(children)?)?)
    }

    /// Deadline whose primary keeps its claim and whose others are proxied.
    ///
    /// Overlap between any two of the tasks is rejected before proxying.
    pub fn disjoint_deadline(
        &mut self,
        primary: Box<dyn Task>,
        others: Vec<Box<dyn Task>>,
    ) -> Result<Deadline> {
        let mut all = Vec::with_capacity(others.len() + 1);
        all.push(primary);
        all.extend(others);
        ensure_disjoint(&all)?;

        let primary = all.remove(0);
        Ok(Deadline::new(primary, self.proxy_all(all)?)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::Rig;
    use crate::{Scheduler, SchedulerError};
    use interlock_compose::{ParallelAll, Sequence, TaskExt};
    use interlock_core::{idle, wait, ConstructionError, ResourceId, Task, TaskState};
    use std::time::Duration;

    #[test]
    fn test_proxy_detaches_requirements() {
        let mut rig = Rig::new();
        let a = rig.a.resource();
        let proxy = rig.scheduler.proxy(idle("hold", a)).unwrap();
        let inner = proxy.target();

        assert!(proxy.requirements().is_empty());
        let outer = rig.scheduler.add(proxy).unwrap();
        rig.scheduler.schedule(outer).unwrap();
        rig.cycle();
        assert_eq!(rig.scheduler.claimant(a), None);
        rig.cycle();

        assert_eq!(rig.scheduler.state(inner), TaskState::Running);
        assert_eq!(rig.scheduler.claimant(a), Some(inner));
    }

    #[test]
    fn test_sequence_holds_resource_through_wait() {
        let mut rig = Rig::with_defaults();
        let seq = Sequence::new(vec![
            rig.a.set_test(1).boxed(),
            wait(Duration::from_millis(100)).boxed(),
            rig.a.set_test(2).boxed(),
        ]);
        let id = rig.scheduler.add(seq).unwrap();

        rig.cycle();
        rig.scheduler.schedule(id).unwrap();
        rig.run(10);

        assert_eq!(
            rig.trace.frames(),
            vec![
                "AdBdCd", "A1BdCd", "BdCd", "BdCd", "BdCd", "BdCd", "A2BdCd", "AdBdCd", "AdBdCd",
                "AdBdCd", "AdBdCd"
            ]
        );
    }

    #[test]
    fn test_disjoint_sequence_releases_between_steps() {
        let mut rig = Rig::with_defaults();
        let seq = rig
            .scheduler
            .disjoint_sequence(vec![
                rig.a.set_test(1).boxed(),
                wait(Duration::from_millis(100)).boxed(),
                rig.a.set_test(2).boxed(),
            ])
            .unwrap();
        let id = rig.scheduler.add(seq).unwrap();

        rig.cycle();
        rig.scheduler.schedule(id).unwrap();
        rig.run(12);

        let frames = rig.trace.frames();
        let first = frames.iter().position(|f| f == "A1BdCd").unwrap();
        let second = frames.iter().position(|f| f == "A2BdCd").unwrap();
        assert_eq!(first, 2);
        assert!(second > first + 1);
        assert!(frames[first + 1..second].iter().any(|f| f == "AdBdCd"));
        assert!(frames[first + 1..second].iter().all(|f| f == "AdBdCd"));
        assert!(!rig.scheduler.is_active(id));
    }

    #[test]
    fn test_disjoint_parallel_checks_raw_children() {
        let mut rig = Rig::new();
        let result = rig.scheduler.disjoint_parallel_all(vec![
            rig.a.set_test(1).boxed(),
            rig.a.set_test(2).boxed(),
        ]);

        assert!(matches!(
            result,
            Err(SchedulerError::Construction(ConstructionError::SharedRequirement { .. }))
        ));
    }

    #[test]
    fn test_disjoint_race_checks_raw_children() {
        let mut rig = Rig::new();
        let result = rig.scheduler.disjoint_race_any(vec![
            rig.b.test_duration(1, Duration::from_millis(60)).boxed(),
            rig.b.set_test(2).boxed(),
        ]);

        assert!(matches!(
            result,
            Err(SchedulerError::Construction(ConstructionError::SharedRequirement { .. }))
        ));
    }

    #[test]
    fn test_disjoint_race_restores_loser_defaults_next_cycle() {
        let mut rig = Rig::with_defaults();
        let race = rig
            .scheduler
            .disjoint_race_any(vec![
                rig.a.test_duration(1, Duration::from_millis(60)).boxed(),
                rig.b.test_duration(1, Duration::from_secs(1)).boxed(),
            ])
            .unwrap();
        assert!(race.requirements().is_empty());
        let id = rig.scheduler.add(race).unwrap();

        rig.cycle();
        rig.scheduler.schedule(id).unwrap();
        rig.run(7);

        assert_eq!(
            rig.trace.frames(),
            vec![
                "AdBdCd", "AdBdCd", "A1B1Cd", "A1B1Cd", "A1B1Cd", "A1B1Cd", "AdBdCd", "AdBdCd"
            ]
        );
        assert!(!rig.scheduler.is_active(id));
        assert_eq!(rig.scheduler.active_tasks().len(), 3);
    }

    #[test]
    fn test_hand_proxied_overlap_interrupts_silently() {
        let mut rig = Rig::with_defaults();
        let first = rig
            .scheduler
            .proxy(rig.a.test_duration(1, Duration::from_millis(100)))
            .unwrap();
        let second = rig
            .scheduler
            .proxy(rig.a.test_duration(2, Duration::from_millis(100)))
            .unwrap();
        let (first_inner, second_inner) = (first.target(), second.target());
        let group = ParallelAll::new(vec![first.boxed(), second.boxed()]).unwrap();
        let id = rig.scheduler.add(group).unwrap();

        rig.scheduler.schedule(id).unwrap();
        rig.cycle();
        rig.cycle();

        assert!(!rig.scheduler.is_active(first_inner));
        assert!(rig.scheduler.is_active(second_inner));
        assert_eq!(rig.trace.frames().last().map(String::as_str), Some("A2BdCd"));
    }

    #[test]
    fn test_disjoint_deadline_primary_keeps_claim() {
        let mut rig = Rig::with_defaults();
        let deadline = rig
            .scheduler
            .disjoint_deadline(
                rig.a.test_duration(1, Duration::from_millis(100)).boxed(),
                vec![rig.b.test_duration(1, Duration::from_secs(1)).boxed()],
            )
            .unwrap();
        assert_eq!(deadline.requirements().len(), 1);
        let id = rig.scheduler.add(deadline).unwrap();

        rig.scheduler.schedule(id).unwrap();
        rig.run(12);

        assert!(!rig.scheduler.is_active(id));
        assert_eq!(rig.trace.frames().last().map(String::as_str), Some("AdBdCd"));
    }

    #[test]
    fn test_unregistered_resource_is_rejected() {
        let mut scheduler = Scheduler::default();
        let result = scheduler.proxy(idle("ghost", ResourceId::from_index(4)));

        assert!(matches!(
            result,
            Err(SchedulerError::Construction(ConstructionError::UnknownResource { .. }))
        ));
    }
}
