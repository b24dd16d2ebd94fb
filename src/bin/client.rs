use clap::{Args, Parser, Subcommand};
use rollcall::client::{StudentClient, BASE_URL};
use rollcall::student::Student;
use rollcall::Error;

#[derive(Parser, Debug)]
#[command(author, version, about = "Talks to a running rollcall server", long_about = None)]
struct Cli {
    /// Base URL of the server
    #[arg(long, env = "ROLLCALL_URL", default_value = BASE_URL)]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a single student.
    Get { id: i64 },
    /// List students, optionally only those whose name contains `--name`.
    List {
        #[arg(long)]
        name: Option<String>,
    },
    /// Create a student.
    Create { name: String },
    /// Replace the name of an existing student.
    Update(UpdateArgs),
    /// Delete a student.
    Delete { id: i64 },
}

#[derive(Args, Debug)]
struct UpdateArgs {
    id: i64,
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    let client = StudentClient::new(cli.base_url);

    match cli.command {
        Command::Get { id } => match client.get(id).await? {
            Some(student) => print_json(&student)?,
            None => return Err(format!("student {id} not found").into()),
        },
        Command::List { name } => {
            let students = match name {
                Some(name) => client.find_by_name(&name).await?,
                None => client.get_all().await?,
            };
            print_json(&students)?;
        }
        Command::Create { name } => {
            let student = client.create(&Student::new(name)).await?;
            print_json(&student)?;
        }
        Command::Update(UpdateArgs { id, name }) => {
            match client.update(&Student::with_id(id, name)).await? {
                Some(student) => print_json(&student)?,
                None => return Err(format!("student {id} not found").into()),
            }
        }
        Command::Delete { id } => {
            if !client.delete(id).await? {
                return Err(format!("student {id} not found").into());
            }
        }
    }

    Ok(())
}

fn print_json(value: &impl serde::Serialize) -> Result<(), Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
