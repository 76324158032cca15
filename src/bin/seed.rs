use chrono::NaiveDate;
use clap::Parser;
use diesel::prelude::*;
use diesel::result::QueryResult;

use atelier::tables::*;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, env = "DATABASE_URL")]
    database: String,
}

fn main() -> QueryResult<()> {
    let args = Args::parse();
    let mut conn = PgConnection::establish(&args.database)
        .unwrap_or_else(|_| panic!("Failed to connect to database: {}", args.database));

    seed_data(&mut conn)
}

fn seed_data(conn: &mut PgConnection) -> QueryResult<()> {
    if !Venue::list(conn)?.is_empty() {
        println!("Venues already present, exiting");
        return Ok(());
    }

    let venue = Venue::create(
        conn,
        NewVenue {
            name: "Lumen Hall".to_string(),
            url: Some("https://lumenhall.example".to_string()),
            locations: vec![Location {
                city: Some("Chicago".to_string()),
                state: Some("IL".to_string()),
                country: Some("USA".to_string()),
                phone_number: None,
            }],
            category: Some(VenueCategory::Accessible),
            ..NewVenue::default()
        },
    )?;
    let dream = Venue::create(
        conn,
        NewVenue {
            name: "Triennale di Milano".to_string(),
            url: Some("https://triennale.example".to_string()),
            locations: vec![Location {
                city: Some("Milan".to_string()),
                country: Some("Italy".to_string()),
                ..Location::default()
            }],
            category: Some(VenueCategory::UltimateDreamGoal),
            ..NewVenue::default()
        },
    )?;

    let contact = Contact::create(
        conn,
        NewContact {
            name: "Ada Reyes".to_string(),
            email: Some("ada@lumenhall.example".to_string()),
            role: Some("Curator".to_string()),
            contact_types: vec![ContactType::VenueContact],
            ..NewContact::default()
        },
    )?;
    VenueContact::link(conn, venue.id, contact.id)?;

    let collaborator = Collaborator::create(
        conn,
        NewCollaborator {
            name: "Marta Kline".to_string(),
            role: Some("Fabricator".to_string()),
            ..NewCollaborator::default()
        },
    )?;

    let project = Project::create(
        conn,
        NewProject {
            name: "Winter Light Residency".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 11, 1),
            budget: Some(4500.0),
            ..NewProject::default()
        },
    )?;
    ProjectVenue::link(conn, project.id, venue.id)?;
    ProjectContact::link(conn, project.id, contact.id)?;
    ProjectCollaborator::link(conn, project.id, collaborator.id)?;

    let task = Task::create(
        conn,
        NewTask {
            title: "Send Lumen Hall proposal".to_string(),
            priority: Some(TaskPriority::High),
            due_date: NaiveDate::from_ymd_opt(2024, 9, 15),
            ..NewTask::default()
        },
    )?;
    TaskVenue::link(conn, task.id, venue.id)?;
    TaskProject::link(conn, task.id, project.id)?;

    let outreach = Outreach::create(
        conn,
        NewOutreach {
            contact_id: Some(contact.id),
            venue_id: Some(venue.id),
            project_id: Some(project.id),
            method: OutreachMethod::Email,
            direction: OutreachDirection::Outbound,
            sent_date: NaiveDate::from_ymd_opt(2024, 8, 20).unwrap(),
            subject: "Winter light installation proposal".to_string(),
            notes: None,
            status: Some(OutreachStatus::AwaitingResponse),
            follow_up_date: NaiveDate::from_ymd_opt(2024, 9, 3),
        },
    )?;

    println!("Created Venue: {}", serde_json::to_string(&venue).unwrap());
    println!("Created Venue: {}", serde_json::to_string(&dream).unwrap());
    println!("Created Contact: {}", serde_json::to_string(&contact).unwrap());
    println!(
        "Created Collaborator: {}",
        serde_json::to_string(&collaborator).unwrap()
    );
    println!("Created Project: {}", serde_json::to_string(&project).unwrap());
    println!("Created Task: {}", serde_json::to_string(&task).unwrap());
    println!("Created Outreach: {}", serde_json::to_string(&outreach).unwrap());

    Ok(())
}
