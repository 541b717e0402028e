//! Linear unlocking of a course: a lesson opens once every lesson before it is done.
//!
//! Ordering is by `(module.order_index, module.id)` and then
//! `(lesson.order_index, lesson.id)`, so ties in `order_index` are still
//! deterministic.

use std::collections::HashMap;

use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct LessonSlot {
    pub id: Uuid,
    pub order_index: i32,
    pub completed: bool,
}

#[derive(Debug, Clone)]
pub struct ModuleSlot {
    pub id: Uuid,
    pub order_index: i32,
    pub lessons: Vec<LessonSlot>,
}

#[derive(Debug, Default, Clone)]
pub struct UnlockMap {
    modules: HashMap<Uuid, bool>,
    lessons: HashMap<Uuid, bool>,
}

impl UnlockMap {
    /// Unknown lessons are reported as locked.
    pub fn lesson_unlocked(&self, id: Uuid) -> bool {
        self.lessons.get(&id).copied().unwrap_or(false)
    }

    pub fn module_unlocked(&self, id: Uuid) -> bool {
        self.modules.get(&id).copied().unwrap_or(false)
    }
}

/// Computes lock state for every module and lesson of one course.
///
/// With `unlock_all` (staff viewers) everything is reported unlocked, the
/// completion flags are ignored.
pub fn resolve_course(mut modules: Vec<ModuleSlot>, unlock_all: bool) -> UnlockMap {
    modules.sort_by_key(|m| (m.order_index, m.id));

    let mut map = UnlockMap::default();
    let mut all_done_so_far = true;

    for mut module in modules {
        module.lessons.sort_by_key(|l| (l.order_index, l.id));
        map.modules.insert(module.id, unlock_all || all_done_so_far);

        for lesson in module.lessons {
            map.lessons.insert(lesson.id, unlock_all || all_done_so_far);
            all_done_so_far &= lesson.completed;
        }
    }

    map
}

#[cfg(test)]
mod test {
    use super::*;

    fn lesson(order_index: i32, completed: bool) -> LessonSlot {
        LessonSlot {
            id: Uuid::new_v4(),
            order_index,
            completed,
        }
    }

    fn module(order_index: i32, lessons: Vec<LessonSlot>) -> ModuleSlot {
        ModuleSlot {
            id: Uuid::new_v4(),
            order_index,
            lessons,
        }
    }

    #[test]
    fn first_lesson_is_always_open() {
        let first = lesson(0, false);
        let second = lesson(1, false);
        let (a, b) = (first.id, second.id);

        let map = resolve_course(vec![module(0, vec![first, second])], false);
        assert!(map.lesson_unlocked(a));
        assert!(!map.lesson_unlocked(b));
    }

    #[test]
    fn completion_opens_the_next_lesson_across_modules() {
        let m1_l1 = lesson(0, true);
        let m1_l2 = lesson(1, true);
        let m2_l1 = lesson(0, false);
        let m2_l2 = lesson(1, false);
        let ids = [m1_l1.id, m1_l2.id, m2_l1.id, m2_l2.id];

        let m1 = module(0, vec![m1_l2, m1_l1]);
        let m2 = module(1, vec![m2_l2, m2_l1]);
        let m2_id = m2.id;

        // input order is shuffled on purpose
        let map = resolve_course(vec![m2, m1], false);
        assert!(map.lesson_unlocked(ids[0]));
        assert!(map.lesson_unlocked(ids[1]));
        assert!(map.lesson_unlocked(ids[2]));
        assert!(!map.lesson_unlocked(ids[3]));
        assert!(map.module_unlocked(m2_id));
    }

    #[test]
    fn a_gap_keeps_later_lessons_locked() {
        // completing lesson 3 without lesson 2 does not skip ahead
        let l1 = lesson(0, true);
        let l2 = lesson(1, false);
        let l3 = lesson(2, true);
        let l4 = lesson(3, false);
        let (i3, i4) = (l3.id, l4.id);

        let map = resolve_course(vec![module(0, vec![l1, l2, l3, l4])], false);
        assert!(!map.lesson_unlocked(i3));
        assert!(!map.lesson_unlocked(i4));
    }

    #[test]
    fn empty_module_follows_previous_completion() {
        let m1 = module(0, vec![lesson(0, false)]);
        let empty = module(1, vec![]);
        let empty_id = empty.id;

        let map = resolve_course(vec![m1, empty], false);
        assert!(!map.module_unlocked(empty_id));
    }

    #[test]
    fn staff_see_everything_unlocked() {
        let l1 = lesson(0, false);
        let l2 = lesson(1, false);
        let i2 = l2.id;
        let m2 = module(1, vec![]);
        let m2_id = m2.id;

        let map = resolve_course(vec![module(0, vec![l1, l2]), m2], true);
        assert!(map.lesson_unlocked(i2));
        assert!(map.module_unlocked(m2_id));
    }

    #[test]
    fn unknown_lesson_is_locked() {
        let map = resolve_course(vec![], false);
        assert!(!map.lesson_unlocked(Uuid::new_v4()));
    }
}
