use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use academy::Config;
use academy::model::entity::{
    Assignment, AssignmentCreate, Cohort, CohortCreate, Course, CourseCreate, Enrollment, Lesson,
    LessonCreate, Module, ModuleCreate, Program, ProgramCreate, UserEntity, UserEntityCreateUpdate,
};
use academy::model::{CrudRepository, DatabaseResult, DbConnection, ModelManager};
use academy::web::{AuthenticatedUser, UserRole};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(about = "CLI tool for filling the academy DB", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Manage programs
    Program {
        #[command(subcommand)]
        action: ProgramCommands,
    },

    /// Manage courses
    Course {
        #[command(subcommand)]
        action: CourseCommands,
    },

    /// Manage modules
    Module {
        #[command(subcommand)]
        action: ModuleCommands,
    },

    /// Manage lessons
    Lesson {
        #[command(subcommand)]
        action: LessonCommands,
    },

    /// Manage assignments
    Assignment {
        #[command(subcommand)]
        action: AssignmentCommands,
    },

    /// Manage cohorts and enrollments
    Cohort {
        #[command(subcommand)]
        action: CohortCommands,
    },
}

/// User management
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// admin, mentor or trainee
        #[arg(long, default_value = "trainee")]
        role: String,
    },
    Role {
        #[arg(long)]
        username: String,
        #[arg(long)]
        role: String,
    },
}

/// Program management
#[derive(Subcommand, Debug)]
pub enum ProgramCommands {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
}

/// Course management
#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    Add {
        /// Program title to attach the course to
        #[arg(long)]
        program_title: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 0)]
        order_index: i32,
    },
}

/// Module management
#[derive(Subcommand, Debug)]
pub enum ModuleCommands {
    Add {
        /// Course title to attach the module to
        #[arg(long)]
        course_title: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 0)]
        order_index: i32,
    },
}

/// Lesson management
#[derive(Subcommand, Debug)]
pub enum LessonCommands {
    Add {
        /// Module title to attach the lesson to
        #[arg(long)]
        module_title: String,
        #[arg(long)]
        title: String,
        /// Path to a Markdown file with lesson content
        #[arg(long)]
        file: String,
        #[arg(long, default_value_t = 0)]
        order_index: i32,
    },
}

/// Assignment management
#[derive(Subcommand, Debug)]
pub enum AssignmentCommands {
    Add {
        /// Module title to attach the assignment to
        #[arg(long)]
        module_title: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Days after the cohort start the assignment is due
        #[arg(long)]
        due_offset_days: Option<i32>,
    },
}

/// Cohort management
#[derive(Subcommand, Debug)]
pub enum CohortCommands {
    Add {
        #[arg(long)]
        program_title: String,
        /// Username of a mentor
        #[arg(long)]
        mentor: String,
        #[arg(long)]
        name: String,
        /// YYYY-MM-DD
        #[arg(long)]
        start_date: NaiveDate,
        /// YYYY-MM-DD
        #[arg(long)]
        end_date: NaiveDate,
    },
    Enroll {
        #[arg(long)]
        cohort_name: String,
        /// Username of a trainee
        #[arg(long)]
        trainee: String,
    },
}

async fn id_by(mm: &ModelManager, query: &'static str, key: &str) -> DatabaseResult<Uuid> {
    let id = sqlx::query_scalar(query)
        .bind(key)
        .fetch_one(mm.executor())
        .await?;
    Ok(id)
}

#[tokio::main]
async fn main() -> academy::error::AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let db_con = match std::env::var("DATABASE_URL") {
        Ok(url) => DbConnection::connect(&url)?,
        Err(_) => DbConnection::connect(Config::get_or_init(false).await.app().database_uri())?,
    };
    let mm = ModelManager::new(db_con);
    let actor = AuthenticatedUser::admin();

    match args.command {
        Commands::User { action } => match action {
            UserCommands::Add { username, password, role } => {
                let user = UserEntity::create(
                    &mm,
                    &actor,
                    UserEntityCreateUpdate {
                        username,
                        password_hash: academy::auth::hash_password(&password)?,
                        role: UserRole::from(role.as_str()),
                    },
                )
                .await?;
                println!("User created: {:?}", user);
            }
            UserCommands::Role { username, role } => {
                let id = id_by(&mm, "SELECT id FROM users WHERE username = $1", &username).await?;
                let user = UserEntity::find_by_id(&mm, &actor, id).await?;
                match user {
                    Some(user) => {
                        let user = user.set_role(&mm, &actor, UserRole::from(role.as_str())).await?;
                        println!("Role changed: {:?}", user);
                    }
                    None => println!("No user {username}"),
                }
            }
        },

        Commands::Program { action } => match action {
            ProgramCommands::Add { title, description } => {
                let program =
                    Program::create(&mm, &actor, ProgramCreate { title, description }).await?;
                println!("Program created: {:?}", program);
            }
        },

        Commands::Course { action } => match action {
            CourseCommands::Add { program_title, title, description, order_index } => {
                let program_id =
                    id_by(&mm, "SELECT id FROM programs WHERE title = $1", &program_title).await?;
                let course = Course::create(
                    &mm,
                    &actor,
                    CourseCreate {
                        program_id,
                        title,
                        description,
                        order_index: Some(order_index),
                    },
                )
                .await?;
                println!("Course created: {:?}", course);
            }
        },

        Commands::Module { action } => match action {
            ModuleCommands::Add { course_title, title, description, order_index } => {
                let course_id =
                    id_by(&mm, "SELECT id FROM courses WHERE title = $1", &course_title).await?;
                let module = Module::create(
                    &mm,
                    &actor,
                    ModuleCreate {
                        course_id,
                        title,
                        description,
                        order_index: Some(order_index),
                    },
                )
                .await?;
                println!("Module created: {:?}", module);
            }
        },

        Commands::Lesson { action } => match action {
            LessonCommands::Add { module_title, title, file, order_index } => {
                let module_id =
                    id_by(&mm, "SELECT id FROM modules WHERE title = $1", &module_title).await?;

                let content = std::fs::read_to_string(file)?;
                let lesson = Lesson::create(
                    &mm,
                    &actor,
                    LessonCreate {
                        module_id,
                        title,
                        content,
                        order_index: Some(order_index),
                    },
                )
                .await?;
                println!("Lesson created: {:?}", lesson);
            }
        },

        Commands::Assignment { action } => match action {
            AssignmentCommands::Add { module_title, title, description, due_offset_days } => {
                let module_id =
                    id_by(&mm, "SELECT id FROM modules WHERE title = $1", &module_title).await?;
                let assignment = Assignment::create(
                    &mm,
                    &actor,
                    AssignmentCreate {
                        module_id,
                        title,
                        description,
                        due_offset_days,
                    },
                )
                .await?;
                println!("Assignment created: {:?}", assignment);
            }
        },

        Commands::Cohort { action } => match action {
            CohortCommands::Add { program_title, mentor, name, start_date, end_date } => {
                let program_id =
                    id_by(&mm, "SELECT id FROM programs WHERE title = $1", &program_title).await?;
                let mentor_id = id_by(
                    &mm,
                    "SELECT id FROM users WHERE username = $1 AND role = 'mentor'",
                    &mentor,
                )
                .await?;
                let cohort = Cohort::create(
                    &mm,
                    &actor,
                    CohortCreate {
                        program_id,
                        mentor_id,
                        name,
                        start_date,
                        end_date,
                    },
                )
                .await?;
                println!("Cohort created: {:?}", cohort);
            }
            CohortCommands::Enroll { cohort_name, trainee } => {
                let cohort_id =
                    id_by(&mm, "SELECT id FROM cohorts WHERE name = $1", &cohort_name).await?;
                let trainee_id = id_by(
                    &mm,
                    "SELECT id FROM users WHERE username = $1 AND role = 'trainee'",
                    &trainee,
                )
                .await?;
                let enrollment = Enrollment::create(&mm, &actor, cohort_id, trainee_id).await?;
                println!("Enrollment created: {:?}", enrollment);
            }
        },
    }

    Ok(())
}
