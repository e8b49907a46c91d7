// Declare handler modules - each file contains one route handler
pub mod create; // POST /projects
pub mod delete; // DELETE /projects/:id
pub mod get;    // GET /projects/:id
pub mod list;   // GET /projects
pub mod update; // PUT /projects/:id

pub use create::project_post;
pub use delete::project_delete;
pub use get::project_get;
pub use list::project_list;
pub use update::project_put;
