use camplanka_core::util::normalize_text_option;
use camplanka_core::Plan;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::cli::PlanCommands;
use crate::commands::common::{
    format_plan_lines, normalize_identifier, normalize_name, wait_live, Workspace,
};
use crate::error::CliError;

/// Fields of `plans add`.
#[derive(Debug, Default)]
pub struct NewPlan {
    pub name: String,
    pub campground: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub participants: Vec<String>,
    pub notes: Option<String>,
}

pub async fn run_plans(command: PlanCommands, workspace: &Workspace) -> Result<(), CliError> {
    match command {
        PlanCommands::List { json } => run_plans_list(json, workspace).await,
        PlanCommands::Add {
            name,
            campground,
            start,
            end,
            participants,
            notes,
        } => {
            let plan = NewPlan {
                name,
                campground,
                start,
                end,
                participants,
                notes,
            };
            run_plans_add(plan, workspace).await.map(|_| ())
        }
        PlanCommands::Remove { id } => run_plans_remove(&id, workspace).await,
    }
}

pub async fn run_plans_list(as_json: bool, workspace: &Workspace) -> Result<(), CliError> {
    let plans = workspace.context().plans();
    let view = wait_live(&plans, "plans").await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&view.entities)?);
    } else if view.entities.is_empty() {
        println!("No trip plans yet");
    } else {
        for line in format_plan_lines(&view.entities) {
            println!("{line}");
        }
    }

    Ok(())
}

/// Create a plan owned by the workspace user. Returns its id.
pub async fn run_plans_add(new_plan: NewPlan, workspace: &Workspace) -> Result<String, CliError> {
    let plan = build_plan(new_plan, &workspace.user().id)?;
    let id = plan.id.clone();

    let plans = workspace.context().plans();
    wait_live(&plans, "plans").await?;
    plans.add(plan).await?;
    workspace.save().await?;

    println!("{id}");
    Ok(id)
}

pub async fn run_plans_remove(id: &str, workspace: &Workspace) -> Result<(), CliError> {
    let id = normalize_identifier(id)?;
    let plans = workspace.context().plans();
    let view = wait_live(&plans, "plans").await?;
    let Some(plan) = view.get(&id) else {
        return Err(CliError::NotFound { kind: "Plan", id });
    };
    let name = plan.name.clone();

    plans.remove(&id).await?;
    workspace.save().await?;

    println!("Deleted {name}");
    Ok(())
}

pub fn build_plan(new_plan: NewPlan, user_id: &str) -> Result<Plan, CliError> {
    if let (Some(start), Some(end)) = (new_plan.start, new_plan.end) {
        if end < start {
            return Err(CliError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
    }

    let participants = new_plan
        .participants
        .iter()
        .map(|participant| normalize_identifier(participant))
        .collect::<Result<Vec<_>, _>>()?;

    let mut plan = Plan::new(user_id, normalize_name(&new_plan.name)?)
        .with_dates(new_plan.start.map(start_of_day), new_plan.end.map(start_of_day))
        .with_participants(participants);
    if let Some(campground) = normalize_text_option(new_plan.campground) {
        plan = plan.with_campground(campground);
    }
    if let Some(notes) = normalize_text_option(new_plan.notes) {
        plan = plan.with_notes(notes);
    }
    Ok(plan)
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
