//! OpenAPI documentation aggregator, served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "calc API",
        version = "0.1.0",
        description = "Distributed arithmetic expression evaluator.",
    ),
    tags(
        (name = "Expressions", description = "Expression submission and status"),
        (name = "Tasks", description = "Worker dispatch protocol"),
        (name = "Health", description = "Liveness and registry metrics"),
    ),
    paths(
        crate::api::expressions::calculate,
        crate::api::expressions::list_expressions,
        crate::api::expressions::get_expression,
        crate::api::tasks::next_task,
        crate::api::tasks::submit_result,
        crate::api::tasks::task_status,
        crate::api::health::health,
        crate::api::health::metrics,
    ),
    components(schemas(
        calc_core::Expression,
        calc_core::ExpressionStatus,
        calc_core::ExpressionInput,
        calc_core::SubmitResponse,
        calc_core::Task,
        calc_core::TaskState,
        calc_core::Dependency,
        calc_core::OperandSlot,
        calc_core::TaskResult,
        calc_core::TaskStatusView,
        crate::api::ErrorResponse,
        crate::api::ExpressionList,
        crate::api::ExpressionEnvelope,
        crate::api::HealthResponse,
    ))
)]
pub struct ApiDoc;
