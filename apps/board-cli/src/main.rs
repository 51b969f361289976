use std::sync::Arc;

use anyhow::Result;
use board_core::{BoardController, RestBoardStore};
use clap::Parser;
use shared::domain::ProjectId;

#[derive(Parser, Debug)]
#[command(about = "Sign in to a TaskFlow server, load one project board and print it")]
struct Args {
    #[arg(long)]
    server_url: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    project_id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let store = RestBoardStore::sign_in(&args.server_url, &args.email, &args.password).await?;
    println!("Signed in as {}", store.session().user.username);

    let controller = BoardController::new(Arc::new(store));
    let project_id = ProjectId::new(args.project_id);
    controller.load_board(&project_id).await?;

    if let Some(project) = controller.project().await {
        println!("{}: {}", project.name, project.description);
    }
    for column in controller.columns().await {
        let tickets = controller.tickets_in_column(&column.id).await;
        println!("\n{} ({})", column.name, tickets.len());
        for ticket in tickets {
            let assignee = controller.member_display_name(ticket.assignee.as_ref()).await;
            let tags = if ticket.tags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", ticket.tags.join(", "))
            };
            println!(
                "  - ({}) {}{tags} - {assignee}",
                ticket.priority.as_str(),
                ticket.title
            );
        }
    }

    Ok(())
}
