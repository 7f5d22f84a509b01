use std::io::{self, Write};

use chrono::{NaiveDate, NaiveTime};
use log::info;
use study_planner::analytics::{format_hours, parse_tags};
use study_planner::{
    ActivityLog, Difficulty, ExportFormat, NewMember, NewResource, NewSession, NewTask, Planner,
    PlannerConfig, ResourceType, RevisionStrategy, SessionStatus, TaskStatus,
};

fn print_help() {
    println!(
        "Commands:\n  help                                        Show this help\n  sample                                      Load sample members and resources\n  topic <difficulty> <hours> <subject> <title...>\n                                              Add a topic task\n  assignment <difficulty> <hours> <YYYY-MM-DD> <title...>\n                                              Add an assignment task\n  tasks                                       List tasks\n  status <task_id> <status>                   Set task status (todo, in_progress, done, revised)\n  tag <task_id> <tags>                        Add tags (separated by , or ;)\n  depend <task_id> <prerequisite_id>          Add a prerequisite\n  order                                       Show study order\n  search <text...>                            Search titles and descriptions\n  session <task_id> <YYYY-MM-DD> <HH:MM> <hours> [location...]\n                                              Schedule a study session\n  session-status <session_id> <status>        Set session status\n  member <name> <email> [role...]             Add a group member\n  resource book <name...>                     Add a book\n  resource room <capacity> <name...>          Add a classroom\n  resource <slides|lab|computer> <name...>    Add another resource\n  reserve <session_id> <resource_id>          Book a resource for a session\n  join <session_id> <member_id>               Add a member to a session\n  group                                       Group overview\n  revisions                                   Revisions due today\n  revised <task_id>                           Mark a revision complete\n  progress                                    Progress report and heatmap\n  conflicts                                   Detect conflicts\n  analytics                                   Status distribution and recommendations\n  export <csv|json> [path]                    Export tasks\n  save <path> | load <path>                   Save or load the planner as JSON\n  logs [n]                                    Show recent activity\n  algorithm <leitner|supermemo>               Switch revision algorithm\n  quit|exit                                   Exit"
    );
}

fn load_sample_data(planner: &mut Planner) {
    planner.add_member(NewMember::new("Alice", "alice@example.com", "Leader"));
    planner.add_member(NewMember::new("Bob", "bob@example.com", "Member"));
    planner.add_resource(NewResource::book(
        "Java Programming",
        "Oracle",
        "978-0134685991",
    ));
    planner.add_resource(NewResource::classroom(
        "Room A101",
        30,
        "Engineering Building",
    ));
}

fn print_tasks(planner: &Planner) {
    let tasks = planner.tasks();
    if tasks.is_empty() {
        println!("No tasks yet.");
        return;
    }
    for task in tasks {
        println!("{task}");
    }
}

fn print_group(planner: &Planner) {
    let group = planner.main_group();
    println!("Group: {}", group.name);
    println!("Total members: {}", group.total_size());
    if let Some(leader) = group.leader().and_then(|id| planner.find_member(id)) {
        println!("Leader: {}", leader.name);
    }
    for id in group.all_members() {
        if let Some(member) = planner.find_member(id) {
            println!(
                "  #{} {} - {} tasks, avg performance {:.1}",
                member.id,
                member,
                planner.tasks_assigned_to(member.id).len(),
                member.average_performance()
            );
        }
    }
}

fn main() {
    env_logger::init();

    let config = match PlannerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {e}; using defaults");
            PlannerConfig::default()
        }
    };
    let log = ActivityLog::new();
    let mut planner = Planner::builder()
        .config(config)
        .listener(log.clone())
        .build();
    info!("planner ready with {} algorithm", planner.algorithm_name());

    println!("Study Planner (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "sample" => {
                load_sample_data(&mut planner);
                println!("Sample data loaded.");
            }
            "topic" | "assignment" => {
                let diff_s = parts.next();
                let hours_s = parts.next();
                let extra = parts.next();
                let title = parts.collect::<Vec<_>>().join(" ");
                match (diff_s, hours_s, extra) {
                    (Some(diff_s), Some(hours_s), Some(extra)) => {
                        let difficulty: Difficulty = match diff_s.parse() { Ok(v) => v, Err(e) => { println!("Error: {e}"); continue; } };
                        let hours: f64 = match hours_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid hours"); continue; } };
                        let draft = if cmd == "topic" {
                            NewTask::topic(title, "", difficulty, hours, extra)
                        } else {
                            let due = match NaiveDate::parse_from_str(extra, "%Y-%m-%d") { Ok(d) => d, Err(_) => { println!("Invalid date (YYYY-MM-DD)"); continue; } };
                            NewTask::assignment(title, "", difficulty, hours, due)
                        };
                        match planner.add_task(draft) {
                            Ok(id) => println!("Task added with ID: {id}"),
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    _ if cmd == "topic" => println!("Usage: topic <difficulty> <hours> <subject> <title...>"),
                    _ => println!("Usage: assignment <difficulty> <hours> <YYYY-MM-DD> <title...>"),
                }
            }
            "tasks" => print_tasks(&planner),
            "status" => {
                match (parts.next(), parts.next()) {
                    (Some(id_s), Some(status_s)) => {
                        let id: u32 = match id_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid id"); continue; } };
                        let status: TaskStatus = match status_s.parse() { Ok(v) => v, Err(e) => { println!("Error: {e}"); continue; } };
                        match planner.set_task_status(id, status) {
                            Ok(()) => println!("Task {id} is now {status}."),
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    _ => println!("Usage: status <task_id> <status>"),
                }
            }
            "tag" => {
                let id_s = parts.next();
                let rest = parts.collect::<Vec<_>>().join(" ");
                match id_s {
                    Some(id_s) if !rest.is_empty() => {
                        let id: u32 = match id_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid id"); continue; } };
                        let mut result = Ok(());
                        for tag in parse_tags(&rest) {
                            result = planner.add_tag(id, tag);
                            if result.is_err() {
                                break;
                            }
                        }
                        match result {
                            Ok(()) => println!("Tags updated."),
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    _ => println!("Usage: tag <task_id> <tags>"),
                }
            }
            "depend" => {
                match (parts.next(), parts.next()) {
                    (Some(task_s), Some(pre_s)) => {
                        let task: u32 = match task_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid task id"); continue; } };
                        let pre: u32 = match pre_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid prerequisite id"); continue; } };
                        match planner.add_dependency(task, pre) {
                            Ok(()) => println!("Task {task} now depends on task {pre}."),
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    _ => println!("Usage: depend <task_id> <prerequisite_id>"),
                }
            }
            "order" => {
                let order = planner.study_order();
                let labels: Vec<String> = order.iter().map(|id| id.to_string()).collect();
                println!("Study order: {}", labels.join(" -> "));
            }
            "search" => {
                let query = parts.collect::<Vec<_>>().join(" ");
                let found = planner.search_tasks(&query);
                println!("{} matching tasks", found.len());
                for task in found {
                    println!("  {task}");
                }
            }
            "session" => {
                let task_s = parts.next();
                let date_s = parts.next();
                let time_s = parts.next();
                let hours_s = parts.next();
                let location = parts.collect::<Vec<_>>().join(" ");
                match (task_s, date_s, time_s, hours_s) {
                    (Some(task_s), Some(date_s), Some(time_s), Some(hours_s)) => {
                        let task: u32 = match task_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid task id"); continue; } };
                        let date = match NaiveDate::parse_from_str(date_s, "%Y-%m-%d") { Ok(d) => d, Err(_) => { println!("Invalid date (YYYY-MM-DD)"); continue; } };
                        let time = match NaiveTime::parse_from_str(time_s, "%H:%M") { Ok(t) => t, Err(_) => { println!("Invalid time (HH:MM)"); continue; } };
                        let hours: f64 = match hours_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid hours"); continue; } };
                        let draft = match NewSession::study_for_hours(task, date.and_time(time), hours, location) { Ok(d) => d, Err(e) => { println!("Error: {e}"); continue; } };
                        match planner.add_session(draft) {
                            Ok(id) => println!("Session scheduled with ID: {id}"),
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    _ => println!("Usage: session <task_id> <YYYY-MM-DD> <HH:MM> <hours> [location...]"),
                }
            }
            "session-status" => {
                match (parts.next(), parts.next()) {
                    (Some(id_s), Some(status_s)) => {
                        let id: u32 = match id_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid id"); continue; } };
                        let status: SessionStatus = match status_s.parse() { Ok(v) => v, Err(e) => { println!("Error: {e}"); continue; } };
                        match planner.set_session_status(id, status) {
                            Ok(()) => println!("Session {id} is now {status}."),
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    _ => println!("Usage: session-status <session_id> <status>"),
                }
            }
            "member" => {
                let name = parts.next();
                let email = parts.next();
                let role = parts.collect::<Vec<_>>().join(" ");
                match (name, email) {
                    (Some(name), Some(email)) => {
                        let id = planner.add_member(NewMember::new(name, email, role));
                        println!("Member added with ID: {id}");
                    }
                    _ => println!("Usage: member <name> <email> [role...]"),
                }
            }
            "resource" => {
                let kind = parts.next().map(str::to_ascii_lowercase);
                let draft = match kind.as_deref() {
                    Some("book") => {
                        let name = parts.collect::<Vec<_>>().join(" ");
                        (!name.is_empty()).then(|| NewResource::book(name, "", ""))
                    }
                    Some("room") | Some("classroom") => {
                        let capacity: u32 = match parts.next().map(str::parse) { Some(Ok(v)) => v, _ => { println!("Invalid capacity"); continue; } };
                        let name = parts.collect::<Vec<_>>().join(" ");
                        (!name.is_empty()).then(|| NewResource::classroom(name, capacity, ""))
                    }
                    Some(other) => {
                        let resource_type: ResourceType = match other.parse() { Ok(v) => v, Err(e) => { println!("Error: {e}"); continue; } };
                        let name = parts.collect::<Vec<_>>().join(" ");
                        (!name.is_empty()).then(|| NewResource::general(name, resource_type))
                    }
                    None => None,
                };
                match draft {
                    Some(draft) => {
                        let id = planner.add_resource(draft);
                        println!("Resource added with ID: {id}");
                    }
                    None => println!("Usage: resource <book|room|slides|lab|computer> [capacity] <name...>"),
                }
            }
            "reserve" | "join" => {
                match (parts.next(), parts.next()) {
                    (Some(session_s), Some(other_s)) => {
                        let session: u32 = match session_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid session id"); continue; } };
                        let other: u32 = match other_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid id"); continue; } };
                        let result = if cmd == "reserve" {
                            planner.book_resource(session, other)
                        } else {
                            planner.assign_member_to_session(session, other)
                        };
                        match result {
                            Ok(()) => println!("Session {session} updated."),
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    _ if cmd == "reserve" => println!("Usage: reserve <session_id> <resource_id>"),
                    _ => println!("Usage: join <session_id> <member_id>"),
                }
            }
            "group" => print_group(&planner),
            "revisions" => {
                let due = planner.todays_revisions();
                if due.is_empty() {
                    println!("No revisions due today.");
                }
                for task in due {
                    println!("  {task}");
                }
            }
            "revised" => {
                let id: u32 = match parts.next().map(str::parse) { Some(Ok(v)) => v, _ => { println!("Usage: revised <task_id>"); continue; } };
                match planner.mark_revision_complete(id) {
                    Some(plan) => println!("Revision recorded. Next revision due {}.", plan.next_due),
                    None => println!("No revision plan for task {id}."),
                }
            }
            "progress" => {
                let report = planner.progress_report();
                println!("{report}");
                println!("{}", planner.productivity_heatmap());
            }
            "conflicts" => {
                let conflicts = planner.detect_conflicts();
                if conflicts.is_empty() {
                    println!("No conflicts detected! Your schedule looks good.");
                } else {
                    println!("Conflicts detected:");
                    for conflict in &conflicts {
                        println!("- {conflict}");
                    }
                }
            }
            "analytics" => {
                println!("Task Status Distribution:");
                for (status, count) in planner.status_breakdown() {
                    println!("{status}: {count} tasks");
                }
                let overdue = planner.overdue_assignments();
                if !overdue.is_empty() {
                    println!("Overdue assignments: {}", overdue.len());
                }
                let report = planner.progress_report();
                println!(
                    "Hours: {} of {} completed",
                    format_hours(report.completed_hours),
                    format_hours(report.total_estimated_hours)
                );
                println!("Recommendations:");
                for rec in planner.recommendations() {
                    println!("- {rec}");
                }
            }
            "export" => {
                let format: ExportFormat = match parts.next().map(str::parse) { Some(Ok(v)) => v, _ => { println!("Usage: export <csv|json> [path]"); continue; } };
                match parts.next() {
                    Some(path) => match planner.write_export(format, path) {
                        Ok(()) => println!("Exported {format} to {path}"),
                        Err(e) => println!("Error: {e}"),
                    },
                    None => match planner.export_tasks(format) {
                        Ok(doc) => println!("{doc}"),
                        Err(e) => println!("Error: {e}"),
                    },
                }
            }
            "save" | "load" => {
                let Some(path) = parts.next() else {
                    println!("Usage: {cmd} <path>");
                    continue;
                };
                let result = if cmd == "save" {
                    planner.save_to(path)
                } else {
                    planner.load_from(path)
                };
                match result {
                    Ok(()) if cmd == "save" => println!("Planner saved to {path}"),
                    Ok(()) => println!("Planner loaded from {path}"),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "logs" => {
                let n: usize = parts.next().and_then(|s| s.parse().ok()).unwrap_or(10);
                for entry in log.recent(n) {
                    println!("{entry}");
                }
            }
            "algorithm" => {
                let strategy: RevisionStrategy = match parts.next().map(str::parse) { Some(Ok(v)) => v, _ => { println!("Usage: algorithm <leitner|supermemo>"); continue; } };
                planner.set_revision_algorithm(strategy.algorithm());
                println!("Revision algorithm set to {strategy}.");
            }
            _ => {
                println!("Unknown command. Type 'help'.");
            }
        }
    }
}
