// src/openapi.rs

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::handlers::{admin, assessment, auth, lessons, profile, rankings, speech};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "TypeMind API",
        description = "Typing tutor: lessons, scoring, rankings and certificates"
    ),
    paths(
        auth::register,
        auth::login,
        assessment::get_passage,
        assessment::submit_assessment,
        lessons::list_lessons,
        lessons::get_lesson,
        lessons::submit_session,
        rankings::get_leaderboard,
        rankings::get_my_ranking,
        profile::get_me,
        profile::list_my_activity,
        profile::list_my_certifications,
        admin::get_overview,
        admin::list_users,
        admin::update_user_status,
        admin::delete_user,
        admin::get_user_analytics,
        admin::list_lessons,
        admin::create_lesson,
        admin::update_lesson,
        admin::delete_lesson,
        admin::get_sample_text,
        admin::generate_text,
        admin::refresh,
        speech::transcribe,
        speech::synthesize,
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "assessments", description = "Placement test"),
        (name = "lessons", description = "Lessons and typing sessions"),
        (name = "rankings", description = "Leaderboards"),
        (name = "profile", description = "Current user"),
        (name = "admin", description = "Administration"),
        (name = "speech", description = "Audio lesson authoring helpers"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` JWT scheme referenced by protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
