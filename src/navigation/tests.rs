use super::*;
use crate::storage::MemoryStorage;

// =========================================================
// section_for
// =========================================================

#[test]
fn test_section_for_longest_prefix() {
    assert_eq!(section_for("/admin"), Section::AdminDashboard);
    assert_eq!(section_for("/admin/courses"), Section::AdminManageCourses);
    assert_eq!(section_for("/admin/courses/42/edit"), Section::AdminManageCourses);
    assert_eq!(section_for("/admin/create-course"), Section::AdminManageCourses);
    assert_eq!(section_for("/course/12"), Section::BrowseCourses);
    assert_eq!(section_for("/courses"), Section::BrowseCourses);
    assert_eq!(section_for("/progress/7"), Section::MyProgress);
    assert_eq!(section_for("/create-quiz/7"), Section::InstructorDashboard);
}

#[test]
fn test_section_for_respects_segment_boundaries() {
    assert_eq!(section_for("/administrator"), Section::Home);
    assert_eq!(section_for("/coursework"), Section::Home);
    assert_eq!(section_for("/my-courses-old"), Section::Home);
}

#[test]
fn test_section_for_ignores_query_and_fragment() {
    assert_eq!(section_for("/my-courses?payment=success"), Section::MyCourses);
    assert_eq!(section_for("/certificates#top"), Section::Certificates);
    assert_eq!(section_for("/?tab=1"), Section::Home);
}

#[test]
fn test_section_for_is_total() {
    for path in ["", "/", "///", "?", "#", "no-leading-slash", "/\u{1F600}", "/admin//courses"] {
        // 任意输入都有结果，不 panic
        let _ = section_for(path);
    }
    assert_eq!(section_for(""), Section::Home);
    assert_eq!(section_for("/unknown/page"), Section::Home);
}

#[test]
fn test_section_round_trips_through_str() {
    for section in Section::ALL {
        assert_eq!(section.as_str().parse::<Section>(), Ok(section));
    }
    assert!("nowhere".parse::<Section>().is_err());
}

// =========================================================
// visible_actions
// =========================================================

#[test]
fn test_visible_actions_per_role() {
    assert_eq!(visible_actions(Viewer::Anonymous), &[NavAction::BrowseCourses]);
    assert_eq!(
        visible_actions(Viewer::Student),
        &[
            NavAction::BrowseCourses,
            NavAction::MyCourses,
            NavAction::MyProgress,
            NavAction::Certificates
        ]
    );
    assert_eq!(
        visible_actions(Viewer::Instructor),
        &[
            NavAction::BrowseCourses,
            NavAction::InstructorDashboard,
            NavAction::CreateCourse
        ]
    );
    assert_eq!(
        visible_actions(Viewer::Admin),
        &[NavAction::AdminDashboard, NavAction::AdminManageCourses]
    );
}

#[test]
fn test_action_sections_match_paths() {
    assert_eq!(NavAction::MyProgress.section(), Section::MyProgress);
    assert_eq!(NavAction::AdminManageCourses.section(), Section::AdminManageCourses);
    assert_eq!(NavAction::CreateCourse.section(), Section::CreateCourse);
}

// =========================================================
// 路由与守卫
// =========================================================

#[test]
fn test_route_parsing() {
    assert_eq!(AppRoute::from_path("/"), AppRoute::Home);
    assert_eq!(AppRoute::from_path("/courses/"), AppRoute::Courses);
    assert_eq!(
        AppRoute::from_path("/course/abc?payment=cancelled"),
        AppRoute::CourseDetail { id: "abc".into() }
    );
    assert_eq!(
        AppRoute::from_path("/create-quiz/9"),
        AppRoute::CreateQuiz {
            course_id: "9".into()
        }
    );
    assert_eq!(AppRoute::from_path("/admin/courses"), AppRoute::AdminCourses);
    assert_eq!(AppRoute::from_path("/course"), AppRoute::NotFound);
    assert_eq!(AppRoute::from_path("/nope"), AppRoute::NotFound);
    assert_eq!(
        AppRoute::from_path(&AppRoute::CourseProgress {
            course_id: "5".into()
        }
        .to_path()),
        AppRoute::CourseProgress {
            course_id: "5".into()
        }
    );
}

#[test]
fn test_guard_rules() {
    let admin_area = AppRoute::Admin;
    assert_eq!(guard(&admin_area, Viewer::Admin), GuardDecision::Allow);
    assert_eq!(guard(&admin_area, Viewer::Student), GuardDecision::Redirect(AppRoute::Home));
    assert_eq!(guard(&admin_area, Viewer::Instructor), GuardDecision::Redirect(AppRoute::Home));
    assert_eq!(guard(&admin_area, Viewer::Anonymous), GuardDecision::Redirect(AppRoute::Login));

    assert_eq!(guard(&AppRoute::MyCourses, Viewer::Anonymous), GuardDecision::Redirect(AppRoute::Login));
    assert_eq!(guard(&AppRoute::MyCourses, Viewer::Instructor), GuardDecision::Allow);

    assert_eq!(guard(&AppRoute::Login, Viewer::Anonymous), GuardDecision::Allow);
    assert_eq!(guard(&AppRoute::Signup, Viewer::Student), GuardDecision::Redirect(AppRoute::Home));

    assert_eq!(guard(&AppRoute::Courses, Viewer::Anonymous), GuardDecision::Allow);
    assert_eq!(guard(&AppRoute::NotFound, Viewer::Admin), GuardDecision::Allow);
}

// =========================================================
// NavigationController
// =========================================================

fn controller() -> (Rc<MemoryStorage>, NavigationController) {
    let scratch = Rc::new(MemoryStorage::new());
    let nav = NavigationController::new(scratch.clone());
    (scratch, nav)
}

#[test]
fn test_navigate_persists_active_section() {
    let (scratch, nav) = controller();

    let resolved = nav.navigate("/my-courses", Viewer::Student);
    assert_eq!(resolved.route, AppRoute::MyCourses);
    assert_eq!(resolved.section, Section::MyCourses);
    assert!(!resolved.was_redirected());
    assert_eq!(scratch.get(ACTIVE_SECTION_KEY).as_deref(), Some("my-courses"));
    assert_eq!(nav.last_section(), Some(Section::MyCourses));
}

#[test]
fn test_student_on_admin_path_lands_home() {
    let (scratch, nav) = controller();

    let resolved = nav.navigate("/admin/courses", Viewer::Student);
    assert_eq!(resolved.route, AppRoute::Home);
    assert_eq!(resolved.redirected_from, Some(AppRoute::AdminCourses));
    assert_eq!(resolved.section, Section::Home);
    assert_eq!(scratch.get(ACTIVE_SECTION_KEY).as_deref(), Some("home"));
}

#[test]
fn test_stale_stored_section_never_overrides_resolution() {
    let (scratch, nav) = controller();
    scratch.set(ACTIVE_SECTION_KEY, "admin-dashboard");

    assert_eq!(nav.last_section(), Some(Section::AdminDashboard));
    let resolved = nav.navigate("/courses", Viewer::Anonymous);
    assert_eq!(resolved.section, Section::BrowseCourses);
    assert_eq!(nav.last_section(), Some(Section::BrowseCourses));
}

#[test]
fn test_garbage_stored_section_is_ignored() {
    let (scratch, nav) = controller();
    scratch.set(ACTIVE_SECTION_KEY, "<script>");
    assert_eq!(nav.last_section(), None);
    nav.forget();
    assert!(scratch.get(ACTIVE_SECTION_KEY).is_none());
}
