use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    learning::{LessonSlot, ModuleSlot, risk::due_at, unlock},
    model::{
        DatabaseResult,
        entity::{Course, ModuleWithLessonsRow, Program},
    },
};

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LessonOutline {
    pub id: Uuid,
    pub title: String,
    pub order_index: i32,
    pub completed: bool,
    #[serde(default)]
    pub unlocked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AssignmentOutline {
    pub id: Uuid,
    pub title: String,
    pub due_offset_days: Option<i32>,
    /// Only known when the caller is enrolled in a cohort of the program.
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ModuleOutline {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub order_index: i32,
    pub unlocked: bool,
    pub lessons: Vec<LessonOutline>,
    pub assignments: Vec<AssignmentOutline>,
}

impl TryFrom<ModuleWithLessonsRow> for ModuleOutline {
    type Error = serde_json::Error;

    fn try_from(value: ModuleWithLessonsRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            course_id: value.course_id,
            title: value.title,
            description: value.description,
            order_index: value.order_index,
            unlocked: false,
            lessons: serde_json::from_value(value.lessons)?,
            assignments: serde_json::from_value(value.assignments)?,
        })
    }
}

impl ModuleOutline {
    pub fn from_rows(rows: Vec<ModuleWithLessonsRow>) -> DatabaseResult<Vec<Self>> {
        Ok(rows
            .into_iter()
            .map(ModuleOutline::try_from)
            .collect::<Result<_, _>>()?)
    }
}

/// Fills in `unlocked` for the modules of a single course.
pub fn apply_unlocks(modules: &mut [ModuleOutline], unlock_all: bool) {
    let slots = modules
        .iter()
        .map(|m| ModuleSlot {
            id: m.id,
            order_index: m.order_index,
            lessons: m
                .lessons
                .iter()
                .map(|l| LessonSlot {
                    id: l.id,
                    order_index: l.order_index,
                    completed: l.completed,
                })
                .collect(),
        })
        .collect();

    let map = unlock::resolve_course(slots, unlock_all);
    for module in modules.iter_mut() {
        module.unlocked = map.module_unlocked(module.id);
        for lesson in module.lessons.iter_mut() {
            lesson.unlocked = map.lesson_unlocked(lesson.id);
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CourseOutline {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub order_index: i32,
    pub modules: Vec<ModuleOutline>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ProgramOutline {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub courses: Vec<CourseOutline>,
}

impl ProgramOutline {
    /// Groups module rows under their courses, in course order.
    ///
    /// `cohort_start` resolves assignment offsets into due dates.
    pub fn build(
        program: &Program,
        mut courses: Vec<Course>,
        rows: Vec<ModuleWithLessonsRow>,
        unlock_all: bool,
        cohort_start: Option<NaiveDate>,
    ) -> DatabaseResult<Self> {
        let mut modules = ModuleOutline::from_rows(rows)?;
        if let Some(start) = cohort_start {
            for assignment in modules.iter_mut().flat_map(|m| m.assignments.iter_mut()) {
                assignment.due_at = due_at(start, assignment.due_offset_days);
            }
        }

        courses.sort_by_key(|c| (c.order_index(), c.id()));

        let courses = courses
            .into_iter()
            .map(|course| {
                let mut own: Vec<ModuleOutline> = modules
                    .iter()
                    .filter(|m| m.course_id == course.id())
                    .cloned()
                    .collect();
                own.sort_by_key(|m| (m.order_index, m.id));
                apply_unlocks(&mut own, unlock_all);

                CourseOutline {
                    id: course.id(),
                    title: course.title().to_string(),
                    description: course.description().to_string(),
                    order_index: course.order_index(),
                    modules: own,
                }
            })
            .collect();

        Ok(Self {
            id: program.id(),
            title: program.title().to_string(),
            description: program.description().to_string(),
            courses,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn lesson(order_index: i32, completed: bool) -> LessonOutline {
        LessonOutline {
            id: Uuid::new_v4(),
            title: format!("lesson {order_index}"),
            order_index,
            completed,
            unlocked: false,
        }
    }

    fn module(order_index: i32, lessons: Vec<LessonOutline>) -> ModuleOutline {
        ModuleOutline {
            id: Uuid::new_v4(),
            course_id: Uuid::nil(),
            title: format!("module {order_index}"),
            description: String::new(),
            order_index,
            unlocked: false,
            lessons,
            assignments: vec![],
        }
    }

    #[test]
    fn unlock_flags_follow_completion() {
        let mut modules = vec![
            module(0, vec![lesson(0, true), lesson(1, false)]),
            module(1, vec![lesson(0, false)]),
        ];
        apply_unlocks(&mut modules, false);

        assert!(modules[0].unlocked);
        assert!(modules[0].lessons[0].unlocked);
        assert!(modules[0].lessons[1].unlocked);
        assert!(!modules[1].unlocked);
        assert!(!modules[1].lessons[0].unlocked);
    }

    #[test]
    fn staff_see_everything_unlocked() {
        let mut modules = vec![module(0, vec![lesson(0, false), lesson(1, false)])];
        apply_unlocks(&mut modules, true);
        assert!(modules[0].lessons.iter().all(|l| l.unlocked));
    }

    #[test]
    fn rows_parse_json_children() {
        let row = ModuleWithLessonsRow {
            id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            title: "Basics".into(),
            description: String::new(),
            order_index: 0,
            lessons: serde_json::json!([
                { "id": Uuid::new_v4(), "title": "Intro", "order_index": 0, "completed": true }
            ]),
            assignments: serde_json::json!([
                { "id": Uuid::new_v4(), "title": "Essay", "due_offset_days": 3 }
            ]),
        };

        let outline = ModuleOutline::try_from(row).unwrap();
        assert_eq!(outline.lessons.len(), 1);
        assert!(outline.lessons[0].completed);
        assert_eq!(outline.assignments[0].due_offset_days, Some(3));
        assert!(outline.assignments[0].due_at.is_none());
    }
}
